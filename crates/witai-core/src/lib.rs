pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use config::{ClientConfig, ClientSection};
pub use error::{ConfigError, EngineError, ParseVerbosityError, WitError};
pub use result::{Outcome, QueryResult};
pub use types::{ContextState, Verbosity, DEFAULT_DEVICE};
