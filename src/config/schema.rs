//! Configuration schema for precache
//!
//! Configuration is stored at `~/.config/precache/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Durable store settings
    pub store: StoreConfig,

    /// Precomputation run settings
    pub precompute: PrecomputeConfig,

    /// Per-function overrides, keyed by function name
    pub functions: BTreeMap<String, FunctionConfig>,
}

impl Config {
    /// Effective settings for one function
    pub fn function(&self, name: &str) -> FunctionSettings {
        let overrides = self.functions.get(name);
        FunctionSettings {
            enabled: overrides.map(|f| f.enabled).unwrap_or(true),
            concurrency: overrides
                .and_then(|f| f.concurrency)
                .unwrap_or(self.precompute.concurrency)
                .max(1),
            timeout_secs: overrides
                .and_then(|f| f.timeout_secs)
                .or(self.precompute.timeout_secs),
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append run events to a journal next to the store file
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: false,
        }
    }
}

/// Durable store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file location (default: data dir/precache/store.json)
    pub path: Option<PathBuf>,
}

/// Precomputation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecomputeConfig {
    /// Maximum simultaneous invocations per function
    pub concurrency: usize,

    /// Per-invocation timeout in seconds (unset = no timeout)
    pub timeout_secs: Option<u64>,

    /// Write the store after this many new results
    pub flush_every: usize,
}

impl Default for PrecomputeConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout_secs: None,
            flush_every: 1,
        }
    }
}

/// Overrides for a single function
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// Precompute this function (default: true)
    pub enabled: bool,

    /// Concurrency override
    pub concurrency: Option<usize>,

    /// Timeout override in seconds
    pub timeout_secs: Option<u64>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: None,
            timeout_secs: None,
        }
    }
}

/// Settings resolved for one function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSettings {
    pub enabled: bool,
    pub concurrency: usize,
    pub timeout_secs: Option<u64>,
}
