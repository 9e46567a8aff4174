use crate::types::ContextState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

/// Failures reported by an engine backend, before any payload is interpreted.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine initialization failed (errno {code})")]
    InitFailed { code: i32 },

    #[error("{op} failed (errno {code})")]
    CallFailed { op: &'static str, code: i32 },

    #[error("{op} returned no response")]
    NullResponse { op: &'static str },

    #[error("{op} rejected: {reason}")]
    Rejected { op: &'static str, reason: String },

    /// Names the offending argument; the value itself may be a credential.
    #[error("{field} contains an interior NUL byte")]
    InteriorNul { field: &'static str },

    #[error("engine not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by a query context.
#[derive(Debug, Error)]
pub enum WitError {
    #[error("cannot initialize wit context: {0}")]
    Init(#[source] EngineError),

    #[error("wit engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("failed to parse result payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid result")]
    InvalidResult,

    #[error("context is {0}")]
    InvalidState(ContextState),

    #[error("an asynchronous query is already pending on this context")]
    ConcurrentCallback,

    #[error("response was dropped before it arrived")]
    ResponseDropped,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown verbosity level: {0:?} (expected error, warn, info, debug or 1-4)")]
pub struct ParseVerbosityError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_display_names_state() {
        let err = WitError::InvalidState(ContextState::Closed);
        assert_eq!(err.to_string(), "context is closed");
    }

    #[test]
    fn test_engine_error_converts_into_wit_error() {
        let err: WitError = EngineError::CallFailed {
            op: "wit_text_query",
            code: 5,
        }
        .into();
        match err {
            WitError::Engine(EngineError::CallFailed { op, code }) => {
                assert_eq!(op, "wit_text_query");
                assert_eq!(code, 5);
            }
            _ => panic!("expected Engine(CallFailed)"),
        }
    }

    #[test]
    fn test_init_error_keeps_source() {
        use std::error::Error as _;
        let err = WitError::Init(EngineError::InitFailed { code: 13 });
        assert!(err.to_string().contains("errno 13"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_interior_nul_names_field_only() {
        let err = WitError::Init(EngineError::InteriorNul {
            field: "access_token",
        });
        assert_eq!(
            err.to_string(),
            "cannot initialize wit context: access_token contains an interior NUL byte"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: WitError = serde_err.into();
        assert!(matches!(err, WitError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse result payload"));
    }
}
