use crate::error::ConfigError;
use crate::types::{Verbosity, DEFAULT_DEVICE};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientSection,

    /// Engine-specific settings, handed to the engine untouched.
    #[serde(default)]
    pub engine: Option<toml::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientSection {
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub verbosity: Verbosity,

    /// Engine name; the build's default engine is used when absent.
    #[serde(default)]
    pub engine: Option<String>,

    #[serde(default = "default_true")]
    pub ignore_missing_audio_handler: bool,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            device: default_device(),
            access_token: String::new(),
            verbosity: Verbosity::default(),
            engine: None,
            ignore_missing_audio_handler: default_true(),
        }
    }
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

fn default_true() -> bool {
    true
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = input.to_string();

    for cap in env_var_pattern().captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

impl ClientConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: ClientConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    pub fn engine_config(&self) -> toml::Value {
        self.engine
            .clone()
            .unwrap_or_else(|| toml::Value::Table(Default::default()))
    }
}
