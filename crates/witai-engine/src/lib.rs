pub mod context;
pub mod engine_trait;
#[cfg(feature = "native")]
pub mod native_engine;
pub mod null_engine;
pub mod policy;
pub mod registry;

pub use context::{Context, ContextOptions, PendingQuery, QueryResponse};
pub use engine_trait::{Completion, InitStatus, WitEngine};
#[cfg(feature = "native")]
pub use native_engine::NativeEngine;
pub use null_engine::{NullEngine, NullEngineStats};
pub use policy::InitPolicy;
pub use registry::{EngineFactory, EngineRegistry, DEFAULT_ENGINE};
