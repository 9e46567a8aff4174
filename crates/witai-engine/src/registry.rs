use crate::engine_trait::WitEngine;
use std::collections::HashMap;
use witai_core::EngineError;

/// Engine used when neither the caller nor the config names one.
#[cfg(feature = "native")]
pub const DEFAULT_ENGINE: &str = "native";
#[cfg(not(feature = "native"))]
pub const DEFAULT_ENGINE: &str = "null";

pub type EngineFactory = fn() -> Box<dyn WitEngine>;

pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", || Box::new(crate::null_engine::NullEngine::new()));
        #[cfg(feature = "native")]
        registry.register("native", || {
            Box::new(crate::native_engine::NativeEngine::new())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: EngineFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn WitEngine>, EngineError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    pub fn list_engines(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
