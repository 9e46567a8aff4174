use crate::error::ParseVerbosityError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// The default recording device on the host machine.
pub const DEFAULT_DEVICE: &str = "default";

/// Logging verbosity forwarded to the engine.
///
/// Levels are ordered `Error < Warn < Info < Debug`; the ordinal starts at 1
/// because the engine treats 0 as "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u32)]
pub enum Verbosity {
    #[default]
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Verbosity {
    pub const ALL: [Verbosity; 4] = [
        Verbosity::Error,
        Verbosity::Warn,
        Verbosity::Info,
        Verbosity::Debug,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(level: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_u32() == level)
    }

    /// Name usable as a `tracing` filter directive.
    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<u32>() {
            return Self::from_u32(level).ok_or_else(|| ParseVerbosityError(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseVerbosityError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Level(u32),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Level(level) => Verbosity::from_u32(level).ok_or_else(|| {
                serde::de::Error::custom(ParseVerbosityError(level.to_string()))
            }),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Lifecycle of a query context. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Open,
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Open => f.write_str("open"),
            ContextState::Closed => f.write_str("closed"),
        }
    }
}
