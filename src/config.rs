//! Configuration loading.
//!
//! Settings come from an optional TOML file; every field has a default, so
//! an empty file (or none at all) yields the standard behaviour:
//!
//! ```toml
//! [engine]
//! poll_budget = 10
//! poll_interval_ms = 2000
//!
//! [registry]
//! soft_cap = 20
//!
//! [store]
//! path = "geofences.json"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Re-polls allowed after the initial state request before eviction.
pub const DEFAULT_POLL_BUDGET: u32 = 10;

/// Delay between an ambiguous state answer and the next request.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Fence count at which the UI stops offering "add".
pub const DEFAULT_SOFT_CAP: usize = 20;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoFenceConfig {
    pub engine: EngineConfig,
    pub registry: RegistryConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl GeoFenceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Transition engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ambiguous re-polls allowed per polling round.
    pub poll_budget: u32,

    /// Delay before each re-poll, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fence registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Advisory maximum number of fences. Not enforced by the registry.
    pub soft_cap: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            soft_cap: DEFAULT_SOFT_CAP,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("geofences.json"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
