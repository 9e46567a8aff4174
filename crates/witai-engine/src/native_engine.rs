//! Binding to `libwit`.
//!
//! libwit reports failures through `errno`, so every call clears it first and
//! reads it back afterwards. Response strings are allocated with `malloc` and
//! released with `free` once copied.
//!
//! A call that returns a response succeeds even when it left `errno` set;
//! libwit's own I/O can set it along the way, so the code is only logged at
//! debug. A null response fails with `CallFailed` when `errno` is set and
//! `NullResponse` otherwise. Calls without a return value fail whenever
//! `errno` is set.
//!
//! The response callback of libwit receives only the payload. Completions are
//! therefore queued process-wide and matched to responses in the order the
//! asynchronous calls were issued.

use crate::engine_trait::{Completion, InitStatus, WitEngine};
use std::collections::VecDeque;
use std::ffi::{c_char, c_int, c_uint, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use witai_core::{EngineError, Verbosity};

#[repr(C)]
struct WitContextRaw {
    _private: [u8; 0],
}

type WitRespCallback = extern "C" fn(*mut c_char);

extern "C" {
    fn wit_init(device: *const c_char, verbosity: c_uint) -> *mut WitContextRaw;
    fn wit_text_query(
        context: *mut WitContextRaw,
        text: *const c_char,
        access_token: *const c_char,
    ) -> *mut c_char;
    fn wit_text_query_async(
        context: *mut WitContextRaw,
        text: *const c_char,
        access_token: *const c_char,
        cb: WitRespCallback,
    );
    fn wit_voice_query_auto(
        context: *mut WitContextRaw,
        access_token: *const c_char,
    ) -> *mut c_char;
    fn wit_voice_query_auto_async(
        context: *mut WitContextRaw,
        access_token: *const c_char,
        cb: WitRespCallback,
    );
    fn wit_voice_query_start(context: *mut WitContextRaw, access_token: *const c_char);
    fn wit_voice_query_stop(context: *mut WitContextRaw) -> *mut c_char;
    fn wit_voice_query_stop_async(context: *mut WitContextRaw, cb: WitRespCallback);
    fn wit_close(context: *mut WitContextRaw);
}

// ─── errno ───────────────────────────────────────────────────────

#[cfg(any(target_os = "linux", target_os = "emscripten"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__error()
}

/// Run `f` with `errno` cleared and return whatever `errno` it left behind.
fn with_errno<T>(f: impl FnOnce() -> T) -> (T, i32) {
    // SAFETY: errno_location points at the calling thread's errno.
    unsafe { *errno_location() = 0 };
    let value = f();
    let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
    (value, code)
}

// ─── malloc-owned strings ────────────────────────────────────────

/// A NUL-terminated string allocated by libwit, freed on drop.
struct NativeString(NonNull<c_char>);

impl NativeString {
    fn from_raw(ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    fn to_string_lossy(&self) -> String {
        // SAFETY: libwit hands out valid NUL-terminated strings.
        unsafe { CStr::from_ptr(self.0.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // SAFETY: the pointer came from malloc and is freed exactly once here.
        unsafe { libc::free(self.0.as_ptr().cast()) }
    }
}

// ─── completion queue ────────────────────────────────────────────

struct PendingCompletion {
    ticket: u64,
    owner: u64,
    done: Completion,
}

static PENDING: Mutex<VecDeque<PendingCompletion>> = Mutex::new(VecDeque::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn pending() -> MutexGuard<'static, VecDeque<PendingCompletion>> {
    PENDING.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn enqueue(owner: u64, done: Completion) -> u64 {
    let ticket = next_id();
    pending().push_back(PendingCompletion {
        ticket,
        owner,
        done,
    });
    ticket
}

fn withdraw(ticket: u64) -> Option<Completion> {
    let mut queue = pending();
    let index = queue.iter().position(|p| p.ticket == ticket)?;
    queue.remove(index).map(|p| p.done)
}

fn discard_owned_by(owner: u64) -> usize {
    let mut queue = pending();
    let before = queue.len();
    queue.retain(|p| p.owner != owner);
    before - queue.len()
}

/// Copy out a response pointer returned alongside `code`, taking ownership of it.
fn take_response(op: &'static str, ptr: *mut c_char, code: i32) -> Result<String, EngineError> {
    match NativeString::from_raw(ptr) {
        Some(response) => {
            if code != 0 {
                tracing::debug!(op, code, "libwit left errno set on a successful call");
            }
            Ok(response.to_string_lossy())
        }
        None if code != 0 => Err(EngineError::CallFailed { op, code }),
        None => Err(EngineError::NullResponse { op }),
    }
}

extern "C" fn response_trampoline(result: *mut c_char) {
    let payload = NativeString::from_raw(result)
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let next = pending().pop_front();
    match next {
        Some(p) => {
            if catch_unwind(AssertUnwindSafe(|| (p.done)(payload))).is_err() {
                tracing::error!(ticket = p.ticket, "response callback panicked");
            }
        }
        None => tracing::warn!("libwit delivered a response with no pending callback"),
    }
}

// ─── engine ──────────────────────────────────────────────────────

pub struct NativeEngine {
    id: u64,
    context: Option<NonNull<WitContextRaw>>,
}

// libwit contexts are not bound to the thread that created them.
unsafe impl Send for NativeEngine {}

impl NativeEngine {
    pub fn new() -> Self {
        Self {
            id: next_id(),
            context: None,
        }
    }

    fn handle(&self, op: &'static str) -> Result<*mut WitContextRaw, EngineError> {
        self.context
            .map(NonNull::as_ptr)
            .ok_or_else(|| EngineError::Rejected {
                op,
                reason: "engine is not initialized".to_string(),
            })
    }

    fn query(
        op: &'static str,
        call: impl FnOnce() -> *mut c_char,
    ) -> Result<String, EngineError> {
        let (ptr, code) = with_errno(call);
        take_response(op, ptr, code)
    }

    fn command(op: &'static str, call: impl FnOnce()) -> Result<(), EngineError> {
        let ((), code) = with_errno(call);
        if code != 0 {
            return Err(EngineError::CallFailed { op, code });
        }
        Ok(())
    }

    fn dispatch(
        &self,
        op: &'static str,
        done: Completion,
        call: impl FnOnce(WitRespCallback),
    ) -> Result<(), EngineError> {
        let ticket = enqueue(self.id, done);
        if let Err(e) = Self::command(op, || call(response_trampoline)) {
            withdraw(ticket);
            return Err(e);
        }
        tracing::trace!(op, ticket, "libwit async call dispatched");
        Ok(())
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WitEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn initialize(
        &mut self,
        device: &CStr,
        verbosity: Verbosity,
        _config: &toml::Value,
    ) -> Result<InitStatus, EngineError> {
        if self.context.is_some() {
            return Err(EngineError::Rejected {
                op: "wit_init",
                reason: "engine is already initialized".to_string(),
            });
        }

        // SAFETY: device outlives the call.
        let (ptr, code) = with_errno(|| unsafe { wit_init(device.as_ptr(), verbosity.as_u32()) });
        let context = NonNull::new(ptr).ok_or(EngineError::InitFailed { code })?;
        self.context = Some(context);

        Ok(InitStatus {
            errno: (code != 0).then_some(code),
        })
    }

    fn text_query(&mut self, text: &CStr, access_token: &CStr) -> Result<String, EngineError> {
        let ctx = self.handle("wit_text_query")?;
        // SAFETY: ctx is live until close; the strings outlive the call.
        Self::query("wit_text_query", || unsafe {
            wit_text_query(ctx, text.as_ptr(), access_token.as_ptr())
        })
    }

    fn text_query_async(
        &mut self,
        text: &CStr,
        access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError> {
        let ctx = self.handle("wit_text_query_async")?;
        // SAFETY: libwit copies the strings before returning.
        self.dispatch("wit_text_query_async", done, |cb| unsafe {
            wit_text_query_async(ctx, text.as_ptr(), access_token.as_ptr(), cb)
        })
    }

    fn voice_query_auto(&mut self, access_token: &CStr) -> Result<String, EngineError> {
        let ctx = self.handle("wit_voice_query_auto")?;
        // SAFETY: ctx is live until close; the token outlives the call.
        Self::query("wit_voice_query_auto", || unsafe {
            wit_voice_query_auto(ctx, access_token.as_ptr())
        })
    }

    fn voice_query_auto_async(
        &mut self,
        access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError> {
        let ctx = self.handle("wit_voice_query_auto_async")?;
        // SAFETY: the token is owned by the context and outlives the request.
        self.dispatch("wit_voice_query_auto_async", done, |cb| unsafe {
            wit_voice_query_auto_async(ctx, access_token.as_ptr(), cb)
        })
    }

    fn voice_query_start(&mut self, access_token: &CStr) -> Result<(), EngineError> {
        let ctx = self.handle("wit_voice_query_start")?;
        // SAFETY: the token is owned by the context and outlives the recording.
        Self::command("wit_voice_query_start", || unsafe {
            wit_voice_query_start(ctx, access_token.as_ptr())
        })
    }

    fn voice_query_stop(&mut self) -> Result<String, EngineError> {
        let ctx = self.handle("wit_voice_query_stop")?;
        // SAFETY: ctx is live until close.
        Self::query("wit_voice_query_stop", || unsafe { wit_voice_query_stop(ctx) })
    }

    fn voice_query_stop_async(&mut self, done: Completion) -> Result<(), EngineError> {
        let ctx = self.handle("wit_voice_query_stop_async")?;
        // SAFETY: ctx is live until close.
        self.dispatch("wit_voice_query_stop_async", done, |cb| unsafe {
            wit_voice_query_stop_async(ctx, cb)
        })
    }

    fn close(&mut self) -> Result<(), EngineError> {
        let Some(ctx) = self.context.take() else {
            return Ok(());
        };

        let discarded = discard_owned_by(self.id);
        if discarded > 0 {
            tracing::debug!(discarded, "dropped undelivered libwit responses");
        }

        // SAFETY: ctx was returned by wit_init and is closed exactly once.
        Self::command("wit_close", || unsafe { wit_close(ctx.as_ptr()) })
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to close libwit context: {e}");
        }
    }
}
