use crate::engine_trait::InitStatus;
use witai_core::EngineError;

/// Decides which error codes reported during engine initialization are fatal.
///
/// Some hosts have no handler for the default audio backend and report
/// `ENOENT` from init even though the engine works. The default policy lets
/// that code through; everything else fails construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitPolicy {
    tolerated: Vec<i32>,
}

impl InitPolicy {
    /// "No audio device handler found".
    pub const MISSING_AUDIO_HANDLER: i32 = libc::ENOENT;

    /// Every reported code is fatal.
    pub fn strict() -> Self {
        Self {
            tolerated: Vec::new(),
        }
    }

    pub fn tolerate(codes: impl IntoIterator<Item = i32>) -> Self {
        let mut tolerated: Vec<i32> = codes.into_iter().collect();
        tolerated.sort_unstable();
        tolerated.dedup();
        Self { tolerated }
    }

    pub fn ignore_missing_audio_handler(ignore: bool) -> Self {
        if ignore {
            Self::tolerate([Self::MISSING_AUDIO_HANDLER])
        } else {
            Self::strict()
        }
    }

    pub fn is_tolerated(&self, code: i32) -> bool {
        self.tolerated.binary_search(&code).is_ok()
    }

    /// `Ok(Some(code))` when a tolerated code was reported.
    pub fn check(&self, status: InitStatus) -> Result<Option<i32>, EngineError> {
        match status.errno {
            None => Ok(None),
            Some(code) if self.is_tolerated(code) => Ok(Some(code)),
            Some(code) => Err(EngineError::InitFailed { code }),
        }
    }
}

impl Default for InitPolicy {
    fn default() -> Self {
        Self::ignore_missing_audio_handler(true)
    }
}
