//! Client for the wit.ai speech and NLU service, backed by `libwit`.
//!
//! Open a [`Context`], issue text or voice queries, and get back a parsed
//! [`QueryResult`] together with its primary [`Outcome`]:
//!
//! ```no_run
//! use witai::{Context, Verbosity, DEFAULT_DEVICE};
//!
//! let mut ctx = Context::new(DEFAULT_DEVICE, "ACCESS_TOKEN", Verbosity::Warn)?;
//! let (_, outcome) = ctx.text_query("turn on the lights")?;
//! println!("{} ({:.2})", outcome.intent, outcome.confidence);
//! ctx.close()?;
//! # Ok::<(), witai::WitError>(())
//! ```
//!
//! Build with the `native` feature to talk to `libwit`; otherwise the
//! in-process `null` engine answers queries.

pub mod cli;

pub use witai_core::{
    ClientConfig, ConfigError, ContextState, EngineError, Outcome, QueryResult, Verbosity,
    WitError, DEFAULT_DEVICE,
};
pub use witai_engine::{
    Context, ContextOptions, EngineRegistry, InitPolicy, PendingQuery, QueryResponse,
    DEFAULT_ENGINE,
};
