use std::ffi::CStr;
use witai_core::{EngineError, Verbosity};

/// Invoked once with the raw response payload, possibly from an engine-owned thread.
pub type Completion = Box<dyn FnOnce(String) + Send + 'static>;

/// What `initialize` observed while bringing the engine up.
///
/// An engine that returns `Ok` is usable; `errno` carries any error code the
/// backend reported on the way, for the caller's init policy to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitStatus {
    pub errno: Option<i32>,
}

impl InitStatus {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn with_errno(code: i32) -> Self {
        Self { errno: Some(code) }
    }
}

/// A speech/NLU backend that answers queries with a JSON payload.
///
/// Strings cross this seam already NUL-terminated so that native backends can
/// hand them straight to C.
pub trait WitEngine: Send {
    fn name(&self) -> &str;

    fn initialize(
        &mut self,
        device: &CStr,
        verbosity: Verbosity,
        config: &toml::Value,
    ) -> Result<InitStatus, EngineError>;

    fn text_query(&mut self, text: &CStr, access_token: &CStr) -> Result<String, EngineError>;

    fn text_query_async(
        &mut self,
        text: &CStr,
        access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError>;

    fn voice_query_auto(&mut self, access_token: &CStr) -> Result<String, EngineError>;

    fn voice_query_auto_async(
        &mut self,
        access_token: &CStr,
        done: Completion,
    ) -> Result<(), EngineError>;

    fn voice_query_start(&mut self, access_token: &CStr) -> Result<(), EngineError>;

    fn voice_query_stop(&mut self) -> Result<String, EngineError>;

    fn voice_query_stop_async(&mut self, done: Completion) -> Result<(), EngineError>;

    /// Release backend resources. Completions not yet delivered are dropped
    /// without being called.
    fn close(&mut self) -> Result<(), EngineError>;
}
