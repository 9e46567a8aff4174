//! Query context: one engine session plus the access token used for every query.
//!
//! A context is `Open` from construction until [`Context::close`], after which
//! every query fails with [`WitError::InvalidState`]. Closing twice is a no-op,
//! and dropping an open context closes it.
//!
//! Each context has a single slot for an asynchronous callback. The slot is
//! filled on registration and emptied right before the callback runs, so at
//! most one asynchronous query can be outstanding per context.

use crate::engine_trait::{Completion, WitEngine};
use crate::policy::InitPolicy;
use crate::registry::{EngineRegistry, DEFAULT_ENGINE};
use std::ffi::CString;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context as TaskContext, Poll};
use tokio::sync::oneshot;
use witai_core::{
    ClientConfig, ContextState, EngineError, Outcome, QueryResult, Verbosity, WitError,
    DEFAULT_DEVICE,
};

/// The result and its primary outcome.
pub type QueryResponse = (QueryResult, Outcome);

type Callback = Box<dyn FnOnce(String) + Send + 'static>;
type CallbackSlot = Arc<Mutex<Option<Callback>>>;

#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub device: String,
    pub access_token: String,
    pub verbosity: Verbosity,
    /// Registry name of the engine; [`DEFAULT_ENGINE`] when `None`.
    pub engine: Option<String>,
    pub engine_config: toml::Value,
    pub init_policy: InitPolicy,
}

impl ContextOptions {
    pub fn new(device: &str, access_token: &str, verbosity: Verbosity) -> Self {
        Self {
            device: device.to_string(),
            access_token: access_token.to_string(),
            verbosity,
            engine: None,
            engine_config: toml::Value::Table(Default::default()),
            init_policy: InitPolicy::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = &config.client;
        Self {
            device: client.device.clone(),
            access_token: client.access_token.clone(),
            verbosity: client.verbosity,
            engine: client.engine.clone(),
            engine_config: config.engine_config(),
            init_policy: InitPolicy::ignore_missing_audio_handler(
                client.ignore_missing_audio_handler,
            ),
        }
    }

    pub fn with_engine(mut self, name: &str) -> Self {
        self.engine = Some(name.to_string());
        self
    }

    pub fn with_engine_config(mut self, config: toml::Value) -> Self {
        self.engine_config = config;
        self
    }

    pub fn with_init_policy(mut self, policy: InitPolicy) -> Self {
        self.init_policy = policy;
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE, "", Verbosity::default())
    }
}

pub struct Context {
    engine: Box<dyn WitEngine>,
    access_token: CString,
    device: String,
    verbosity: Verbosity,
    state: ContextState,
    pending: CallbackSlot,
}

impl Context {
    /// Open a context on the default engine with the default init policy.
    pub fn new(device: &str, access_token: &str, verbosity: Verbosity) -> Result<Self, WitError> {
        Self::open(
            &ContextOptions::new(device, access_token, verbosity),
            &EngineRegistry::new(),
        )
    }

    pub fn open(options: &ContextOptions, registry: &EngineRegistry) -> Result<Self, WitError> {
        let engine = registry
            .create(options.engine_name())
            .map_err(WitError::Init)?;
        Self::with_engine(engine, options)
    }

    /// Initialize `engine` and wrap it. `options.engine` is ignored.
    pub fn with_engine(
        mut engine: Box<dyn WitEngine>,
        options: &ContextOptions,
    ) -> Result<Self, WitError> {
        let access_token =
            to_cstring("access_token", &options.access_token).map_err(WitError::Init)?;
        let device = to_cstring("device", &options.device).map_err(WitError::Init)?;

        let status = engine
            .initialize(&device, options.verbosity, &options.engine_config)
            .map_err(WitError::Init)?;

        match options.init_policy.check(status) {
            Ok(None) => {}
            Ok(Some(code)) => {
                tracing::warn!(
                    engine = %engine.name(),
                    device = %options.device,
                    code,
                    "ignoring init error: no audio device handler found"
                );
            }
            Err(e) => {
                if let Err(close_err) = engine.close() {
                    tracing::warn!(engine = %engine.name(), "close after failed init: {close_err}");
                }
                return Err(WitError::Init(e));
            }
        }

        tracing::info!(
            engine = %engine.name(),
            device = %options.device,
            verbosity = %options.verbosity,
            "wit context opened"
        );

        Ok(Self {
            engine,
            access_token,
            device: options.device.clone(),
            verbosity: options.verbosity,
            state: ContextState::Open,
            pending: Arc::new(Mutex::new(None)),
        })
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ContextState::Open
    }

    pub fn has_pending_callback(&self) -> bool {
        lock_slot(&self.pending).is_some()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Query with a text string and block until the response arrives.
    pub fn text_query(&mut self, text: &str) -> Result<QueryResponse, WitError> {
        self.ensure_open()?;
        let text = to_cstring("text", text)?;
        tracing::debug!(engine = %self.engine.name(), "text query");
        let payload = self.engine.text_query(&text, &self.access_token)?;
        parse_response(&payload)
    }

    /// Issue a text query and return immediately. `on_done` later receives the
    /// raw payload on a thread owned by the engine.
    pub fn text_query_async<F>(&mut self, text: &str, on_done: F) -> Result<(), WitError>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.ensure_open()?;
        let text = to_cstring("text", text)?;
        let completion = self.register(Box::new(on_done))?;
        tracing::debug!(engine = %self.engine.name(), "async text query");
        let dispatched = self
            .engine
            .text_query_async(&text, &self.access_token, completion);
        self.settle(dispatched)
    }

    pub fn text_query_pending(&mut self, text: &str) -> Result<PendingQuery, WitError> {
        let (respond, pending) = PendingQuery::channel();
        self.text_query_async(text, respond)?;
        Ok(pending)
    }

    /// Record from the configured device until the end of the utterance and
    /// block until the response arrives.
    pub fn voice_query_auto(&mut self) -> Result<QueryResponse, WitError> {
        self.ensure_open()?;
        tracing::debug!(engine = %self.engine.name(), device = %self.device, "voice query");
        let payload = self.engine.voice_query_auto(&self.access_token)?;
        parse_response(&payload)
    }

    pub fn voice_query_auto_async<F>(&mut self, on_done: F) -> Result<(), WitError>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.ensure_open()?;
        let completion = self.register(Box::new(on_done))?;
        tracing::debug!(engine = %self.engine.name(), device = %self.device, "async voice query");
        let dispatched = self
            .engine
            .voice_query_auto_async(&self.access_token, completion);
        self.settle(dispatched)
    }

    pub fn voice_query_auto_pending(&mut self) -> Result<PendingQuery, WitError> {
        let (respond, pending) = PendingQuery::channel();
        self.voice_query_auto_async(respond)?;
        Ok(pending)
    }

    /// Start recording and return immediately. Recording runs until one of the
    /// `voice_query_stop*` calls.
    pub fn voice_query_start(&mut self) -> Result<(), WitError> {
        self.ensure_open()?;
        tracing::debug!(engine = %self.engine.name(), device = %self.device, "recording started");
        self.engine.voice_query_start(&self.access_token)?;
        Ok(())
    }

    /// Stop recording, send the captured audio and block until the response arrives.
    pub fn voice_query_stop(&mut self) -> Result<QueryResponse, WitError> {
        self.ensure_open()?;
        tracing::debug!(engine = %self.engine.name(), "recording stopped");
        let payload = self.engine.voice_query_stop()?;
        parse_response(&payload)
    }

    pub fn voice_query_stop_async<F>(&mut self, on_done: F) -> Result<(), WitError>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.ensure_open()?;
        let completion = self.register(Box::new(on_done))?;
        tracing::debug!(engine = %self.engine.name(), "recording stopped, awaiting response");
        let dispatched = self.engine.voice_query_stop_async(completion);
        self.settle(dispatched)
    }

    pub fn voice_query_stop_pending(&mut self) -> Result<PendingQuery, WitError> {
        let (respond, pending) = PendingQuery::channel();
        self.voice_query_stop_async(respond)?;
        Ok(pending)
    }

    /// Release the engine and the access token. Any pending callback is
    /// discarded without being called. Calling `close` again does nothing.
    pub fn close(&mut self) -> Result<(), WitError> {
        if self.state == ContextState::Closed {
            tracing::debug!("wit context already closed");
            return Ok(());
        }
        self.state = ContextState::Closed;

        if lock_slot(&self.pending).take().is_some() {
            tracing::warn!(engine = %self.engine.name(), "discarding pending callback on close");
        }

        let closed = self.engine.close();
        self.access_token = CString::default();
        tracing::info!(engine = %self.engine.name(), device = %self.device, "wit context closed");
        closed.map_err(WitError::from)
    }

    fn ensure_open(&self) -> Result<(), WitError> {
        match self.state {
            ContextState::Open => Ok(()),
            state => Err(WitError::InvalidState(state)),
        }
    }

    /// Claim the callback slot and build the completion handed to the engine.
    fn register(&self, callback: Callback) -> Result<Completion, WitError> {
        {
            let mut slot = lock_slot(&self.pending);
            if slot.is_some() {
                return Err(WitError::ConcurrentCallback);
            }
            *slot = Some(callback);
        }

        let pending = Arc::clone(&self.pending);
        Ok(Box::new(move |payload: String| {
            let callback = lock_slot(&pending).take();
            match callback {
                Some(callback) => callback(payload),
                None => tracing::debug!("response arrived with no callback registered"),
            }
        }))
    }

    fn settle(&self, dispatched: Result<(), EngineError>) -> Result<(), WitError> {
        if let Err(e) = dispatched {
            lock_slot(&self.pending).take();
            return Err(e.into());
        }
        Ok(())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to close wit context on drop: {e}");
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("engine", &self.engine.name())
            .field("device", &self.device)
            .field("verbosity", &self.verbosity)
            .field("state", &self.state)
            .field("pending_callback", &self.has_pending_callback())
            .finish_non_exhaustive()
    }
}

/// A parsed response that will be delivered later.
///
/// Await it from async code, or call [`blocking_wait`](Self::blocking_wait)
/// from a thread that is not driving a tokio runtime. Resolves to
/// [`WitError::ResponseDropped`] if the context discarded the callback.
pub struct PendingQuery {
    rx: oneshot::Receiver<Result<QueryResponse, WitError>>,
}

impl PendingQuery {
    fn channel() -> (impl FnOnce(String) + Send + 'static, Self) {
        let (tx, rx) = oneshot::channel();
        let respond = move |payload: String| {
            let _ = tx.send(parse_response(&payload));
        };
        (respond, Self { rx })
    }

    pub fn blocking_wait(self) -> Result<QueryResponse, WitError> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(WitError::ResponseDropped))
    }
}

impl Future for PendingQuery {
    type Output = Result<QueryResponse, WitError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WitError::ResponseDropped)))
    }
}

fn parse_response(payload: &str) -> Result<QueryResponse, WitError> {
    tracing::trace!(bytes = payload.len(), "parsing response payload");
    QueryResult::parse(payload)?.into_primary()
}

fn to_cstring(field: &'static str, s: &str) -> Result<CString, EngineError> {
    CString::new(s).map_err(|_| EngineError::InteriorNul { field })
}

fn lock_slot(slot: &Mutex<Option<Callback>>) -> MutexGuard<'_, Option<Callback>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullEngine;
    use std::sync::mpsc;
    use std::time::Duration;

    const HELLO: &str = r#"{"_text":"hello","msg_id":"abc","outcomes":[{"_text":"hello","confidence":0.98,"intent":"greet"}]}"#;
    const EMPTY: &str = r#"{"_text":"","msg_id":"x","outcomes":[]}"#;

    fn options() -> ContextOptions {
        ContextOptions::new(DEFAULT_DEVICE, "token", Verbosity::Debug)
    }

    fn open(engine: NullEngine) -> Context {
        Context::with_engine(Box::new(engine), &options()).unwrap()
    }

    #[test]
    fn test_context_open_with_registry() {
        let ctx = Context::open(&options().with_engine("null"), &EngineRegistry::new()).unwrap();
        assert_eq!(ctx.state(), ContextState::Open);
        assert_eq!(ctx.engine_name(), "null");
        assert_eq!(ctx.device(), "default");
        assert_eq!(ctx.verbosity(), Verbosity::Debug);
    }

    #[test]
    fn test_context_open_unknown_engine_is_init_error() {
        let result = Context::open(&options().with_engine("nope"), &EngineRegistry::new());
        match result {
            Err(WitError::Init(EngineError::NotFound(name))) => assert_eq!(name, "nope"),
            other => panic!("expected Init(NotFound), got {other:?}"),
        }
    }

    #[test]
    fn test_text_query_returns_result_and_primary() {
        let mut ctx = open(NullEngine::new().with_payload(HELLO));
        let (result, outcome) = ctx.text_query("hello").unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(result.msg_id, "abc");
        assert_eq!(outcome.intent, "greet");
        assert_eq!(result.outcomes[0], outcome);
    }

    #[test]
    fn test_text_query_invalid_result() {
        let mut ctx = open(NullEngine::new().with_payload(EMPTY));
        assert!(matches!(ctx.text_query("anything"), Err(WitError::InvalidResult)));
    }

    #[test]
    fn test_text_query_malformed_payload() {
        let mut ctx = open(NullEngine::new().with_payload("{not json"));
        assert!(matches!(ctx.text_query("anything"), Err(WitError::Parse(_))));
    }

    #[test]
    fn test_text_query_empty_text_is_invalid_with_echo_engine() {
        let mut ctx = open(NullEngine::new());
        assert!(matches!(ctx.text_query(""), Err(WitError::InvalidResult)));
    }

    #[test]
    fn test_text_query_interior_nul_rejected() {
        let engine = NullEngine::new();
        let stats = engine.stats();
        let mut ctx = open(engine);
        match ctx.text_query("a\0b") {
            Err(WitError::Engine(EngineError::InteriorNul { field })) => assert_eq!(field, "text"),
            other => panic!("expected InteriorNul, got {other:?}"),
        }
        assert_eq!(stats.queries(), 0);
    }

    #[test]
    fn test_access_token_with_nul_fails_construction() {
        let opts = ContextOptions::new("default", "bad\0token", Verbosity::Error);
        let result = Context::with_engine(Box::new(NullEngine::new()), &opts);
        assert!(matches!(
            result,
            Err(WitError::Init(EngineError::InteriorNul {
                field: "access_token"
            }))
        ));
    }

    #[test]
    fn test_bad_access_token_is_not_echoed_in_error() {
        let opts = ContextOptions::new("default", "sk-SECRET-TOKEN\0x", Verbosity::Error);
        let err = Context::with_engine(Box::new(NullEngine::new()), &opts).unwrap_err();
        let message = format!("{err} / {err:?}");
        assert!(message.contains("access_token"));
        assert!(!message.contains("SECRET"));
    }

    #[test]
    fn test_voice_query_auto() {
        let mut ctx = open(NullEngine::new());
        let (result, outcome) = ctx.voice_query_auto().unwrap();
        assert_eq!(result.text, "[null] voice query");
        assert_eq!(outcome.intent, "null");
    }

    #[test]
    fn test_voice_query_start_then_stop() {
        let mut ctx = open(NullEngine::new());
        ctx.voice_query_start().unwrap();
        let (_, outcome) = ctx.voice_query_stop().unwrap();
        assert_eq!(outcome.text, "[null] voice query");
    }

    #[test]
    fn test_voice_query_stop_without_start_is_engine_error() {
        let mut ctx = open(NullEngine::new());
        assert!(matches!(
            ctx.voice_query_stop(),
            Err(WitError::Engine(EngineError::Rejected { .. }))
        ));
    }

    #[test]
    fn test_closed_context_rejects_every_query() {
        let mut ctx = open(NullEngine::new());
        ctx.close().unwrap();
        assert!(!ctx.is_open());

        fn assert_closed<T: fmt::Debug>(result: Result<T, WitError>) {
            match result {
                Err(WitError::InvalidState(ContextState::Closed)) => {}
                other => panic!("expected InvalidState(Closed), got {other:?}"),
            }
        }

        assert_closed(ctx.text_query("hi"));
        assert_closed(ctx.text_query_async("hi", |_| {}));
        assert_closed(ctx.text_query_pending("hi").map(|_| ()));
        assert_closed(ctx.voice_query_auto());
        assert_closed(ctx.voice_query_auto_async(|_| {}));
        assert_closed(ctx.voice_query_start());
        assert_closed(ctx.voice_query_stop());
        assert_closed(ctx.voice_query_stop_async(|_| {}));
    }

    #[test]
    fn test_close_twice_releases_once() {
        let engine = NullEngine::new();
        let stats = engine.stats();
        let mut ctx = open(engine);
        ctx.close().unwrap();
        ctx.close().unwrap();
        drop(ctx);
        assert_eq!(stats.closes(), 1);
    }

    #[test]
    fn test_drop_closes_open_context() {
        let engine = NullEngine::new();
        let stats = engine.stats();
        drop(open(engine));
        assert_eq!(stats.closes(), 1);
    }

    #[test]
    fn test_close_after_failed_query() {
        let mut ctx = open(NullEngine::new().with_payload(EMPTY));
        assert!(ctx.text_query("x").is_err());
        assert!(ctx.close().is_ok());
        assert_eq!(ctx.state(), ContextState::Closed);
    }

    #[test]
    fn test_tolerated_init_error_still_opens() {
        let engine = NullEngine::new().with_init_errno(InitPolicy::MISSING_AUDIO_HANDLER);
        let ctx = Context::with_engine(Box::new(engine), &options()).unwrap();
        assert!(ctx.is_open());
    }

    #[test]
    fn test_strict_policy_fails_and_closes_engine() {
        let engine = NullEngine::new().with_init_errno(InitPolicy::MISSING_AUDIO_HANDLER);
        let stats = engine.stats();
        let opts = options().with_init_policy(InitPolicy::strict());
        match Context::with_engine(Box::new(engine), &opts) {
            Err(WitError::Init(EngineError::InitFailed { code })) => {
                assert_eq!(code, InitPolicy::MISSING_AUDIO_HANDLER);
            }
            other => panic!("expected Init(InitFailed), got {other:?}"),
        }
        assert_eq!(stats.closes(), 1);
    }

    #[test]
    fn test_other_init_errors_are_fatal() {
        let engine = NullEngine::new().with_init_errno(libc::EACCES);
        let result = Context::with_engine(Box::new(engine), &options());
        assert!(matches!(
            result,
            Err(WitError::Init(EngineError::InitFailed { code })) if code == libc::EACCES
        ));
    }

    #[test]
    fn test_text_query_async_invokes_callback_once_and_clears_slot() {
        let mut ctx = open(NullEngine::new().with_payload(HELLO));
        let (tx, rx) = mpsc::channel();
        ctx.text_query_async("hello", move |payload| tx.send(payload).unwrap())
            .unwrap();

        let payload = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(payload, HELLO);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(!ctx.has_pending_callback());

        // The slot is free again.
        let (tx, rx) = mpsc::channel();
        ctx.voice_query_auto_async(move |payload| tx.send(payload).unwrap())
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_second_async_registration_is_rejected() {
        let mut ctx = open(NullEngine::new().with_async_delay(Duration::from_millis(300)));
        let (tx, rx) = mpsc::channel();
        ctx.text_query_async("first", move |payload| tx.send(payload).unwrap())
            .unwrap();
        assert!(ctx.has_pending_callback());

        assert!(matches!(
            ctx.text_query_async("second", |_| panic!("second callback must not run")),
            Err(WitError::ConcurrentCallback)
        ));

        let payload = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(payload.contains("first"));
    }

    #[test]
    fn test_failed_dispatch_frees_slot() {
        let mut ctx = open(NullEngine::new());
        // Not recording, so the engine rejects the stop.
        assert!(ctx.voice_query_stop_async(|_| {}).is_err());
        assert!(!ctx.has_pending_callback());
        assert!(ctx.text_query_async("ok", |_| {}).is_ok());
    }

    #[test]
    fn test_close_discards_pending_callback() {
        let mut ctx = open(NullEngine::new().with_async_delay(Duration::from_millis(100)));
        let (tx, rx) = mpsc::channel::<String>();
        ctx.text_query_async("late", move |payload| tx.send(payload).unwrap())
            .unwrap();
        ctx.close().unwrap();
        assert!(!ctx.has_pending_callback());
        // The callback was dropped with its sender, so nothing ever arrives.
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }

    #[test]
    fn test_pending_query_blocking_wait() {
        let mut ctx = open(NullEngine::new().with_payload(HELLO));
        let pending = ctx.text_query_pending("hello").unwrap();
        let (result, outcome) = pending.blocking_wait().unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(outcome.intent, "greet");
    }

    #[test]
    fn test_pending_query_reports_invalid_result() {
        let mut ctx = open(NullEngine::new().with_payload(EMPTY));
        let pending = ctx.voice_query_auto_pending().unwrap();
        assert!(matches!(pending.blocking_wait(), Err(WitError::InvalidResult)));
    }

    #[test]
    fn test_pending_query_dropped_on_close() {
        let mut ctx = open(NullEngine::new().with_async_delay(Duration::from_millis(100)));
        let pending = ctx.text_query_pending("late").unwrap();
        ctx.close().unwrap();
        assert!(matches!(pending.blocking_wait(), Err(WitError::ResponseDropped)));
    }

    #[tokio::test]
    async fn test_pending_query_await() {
        let mut ctx = open(NullEngine::new());
        ctx.voice_query_start().unwrap();
        let pending = ctx.voice_query_stop_pending().unwrap();
        let (_, outcome) = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("timed out")
            .unwrap();
        assert_eq!(outcome.text, "[null] voice query");
    }

    #[test]
    fn test_options_from_config() {
        let config = ClientConfig::from_toml_str(
            r#"
[client]
device = "usb"
access_token = "tok"
verbosity = "info"
engine = "null"
ignore_missing_audio_handler = false

[engine]
transcript = "configured"
"#,
        )
        .unwrap();
        let opts = ContextOptions::from_config(&config);
        assert_eq!(opts.device, "usb");
        assert_eq!(opts.access_token, "tok");
        assert_eq!(opts.verbosity, Verbosity::Info);
        assert_eq!(opts.engine_name(), "null");
        assert_eq!(opts.init_policy, InitPolicy::strict());

        let mut ctx = Context::open(&opts, &EngineRegistry::new()).unwrap();
        let (result, _) = ctx.voice_query_auto().unwrap();
        assert_eq!(result.text, "configured");
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let ctx = open(NullEngine::new());
        let debug = format!("{ctx:?}");
        assert!(debug.contains("null"));
        assert!(!debug.contains("token"));
    }

    #[test]
    fn test_context_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Context>();
        assert_send::<PendingQuery>();
    }
}
