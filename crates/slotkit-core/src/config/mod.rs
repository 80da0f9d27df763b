//! Configuration for slotkit
//!
//! Values come from defaults, then an optional JSON/TOML/YAML file, then
//! `SLOTKIT_*` environment variables.

mod env_loader;
mod file_loader;
mod logging_config;

pub use env_loader::{
    ENV_LOG_LEVEL, ENV_MAX_ATTEMPTS, ENV_RETRY_DELAY, ENV_STALE_TIME, apply_overrides,
    load_from_env,
};
pub use file_loader::{load_from_file, render_for_path, save_to_file};
pub use logging_config::LoggingConfig;

use crate::cache::{CachePolicy, CacheStore, MemoryCacheStore};
use crate::error::SlotResult;
use crate::recovery::RetryConfig;
use crate::stream::{ChunkFraming, Method, RequestDescription, StreamConfig, transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "slotkit.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotkitConfig {
    /// Automatic retry policy for controllers
    pub retry: RetryConfig,
    /// Result cache settings
    pub cache: CacheConfig,
    /// Defaults for stream requests
    pub stream: StreamSettings,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl SlotkitConfig {
    /// Load from `path` (defaults when absent), then apply environment
    /// overrides
    pub fn load(path: Option<&Path>) -> SlotResult<Self> {
        let mut config = match path {
            Some(path) => load_from_file(path)?,
            None => load_from_file(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        load_from_env(&mut config)?;
        Ok(config)
    }
}

/// Result cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window; zero disables cache reads
    #[serde(with = "humantime_serde")]
    pub stale_time: Duration,
    /// LRU bound on the number of entries; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

impl CacheConfig {
    /// Build the store these settings describe
    pub fn build_store(&self) -> Arc<dyn CacheStore> {
        Arc::new(MemoryCacheStore::from_capacity(self.max_entries))
    }

    /// Cache policy for `key` using the configured window
    pub fn policy(&self, key: impl Into<String>) -> CachePolicy {
        CachePolicy::new(key, self.stale_time)
    }
}

/// Defaults for stream requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Request method
    pub method: Method,
    /// Headers sent with every stream request
    pub headers: BTreeMap<String, String>,
    /// How reads are cut into chunks
    pub framing: ChunkFraming,
    /// JSON field (or `/pointer`) extracted from `data:` chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl StreamSettings {
    /// Build a stream config for `endpoint` from these settings
    pub fn stream_config(&self, endpoint: impl Into<String>) -> StreamConfig {
        let request = RequestDescription {
            headers: self.headers.clone(),
            ..RequestDescription::new(endpoint).with_method(self.method)
        };

        let config = StreamConfig::from_request(request).with_framing(self.framing);
        match &self.field {
            Some(field) => config.with_transform(transform::sse_json_field(field.as_str())),
            None => config,
        }
    }
}
