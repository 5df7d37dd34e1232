//! Configuration.
//!
//! Every field has a default so an empty (or missing) TOML file is valid.
//!
//! ```toml
//! [queue]
//! notify_window_ms = 300
//! save_window_ms = 1000
//! max_retries = 3
//! storage_key = "ferry.queue"
//!
//! [remote]
//! endpoint = "http://192.168.1.20:8000"
//! request_timeout_secs = 60
//!
//! [storage]
//! state_dir = "/var/lib/ferry"
//!
//! [scan]
//! extensions = ["pdf", "md"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::queue::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Tuning of the queue core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Throttle window for observer notifications.
    pub notify_window_ms: u64,
    /// Debounce window for snapshot writes.
    pub save_window_ms: u64,
    pub max_retries: u32,
    /// Blob storage key for the snapshot.
    pub storage_key: String,
}

impl QueueConfig {
    pub fn notify_window(&self) -> Duration {
        Duration::from_millis(self.notify_window_ms)
    }

    pub fn save_window(&self) -> Duration {
        Duration::from_millis(self.save_window_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            notify_window_ms: 300,
            save_window_ms: 1000,
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            storage_key: "ferry.queue".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".ferry"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Overrides the built-in extension list when non-empty.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub queue: QueueConfig,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
}

impl FerryConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
