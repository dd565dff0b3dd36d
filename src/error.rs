//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Registration errors
    #[error("Function {function} declares no parameters; nothing to enumerate")]
    NoParameters { function: String },

    #[error("Parameter {parameter} of {function} has type {type_name}, which has no finite domain")]
    NotEnumerable {
        function: String,
        parameter: String,
        type_name: String,
    },

    #[error("Parameter {parameter} of {function} has an empty domain")]
    EmptyDomain { function: String, parameter: String },

    #[error("Parameter {parameter} is declared twice on {function}")]
    DuplicateParameter { function: String, parameter: String },

    #[error("Parameter {parameter} of {function} lists value {value} more than once")]
    DuplicateValue {
        function: String,
        parameter: String,
        value: String,
    },

    #[error("Function {function} has more combinations than can be enumerated")]
    DomainTooLarge { function: String },

    #[error("Invalid function name {0:?}: use letters, digits, '_', '-' or '.'")]
    InvalidFunctionName(String),

    #[error("Function already registered: {0}")]
    DuplicateFunction(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Store errors
    #[error("Store file {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    // Computation errors
    #[error("Computation failed for {key}: {reason}")]
    Computation {
        function: String,
        key: String,
        reason: String,
    },

    #[error("Computation for {key} timed out after {secs}s")]
    Timeout { key: String, secs: u64 },

    // Serving errors
    #[error("Not precomputed: {function} has no entry for {key}")]
    CacheMiss { function: String, key: String },

    #[error("Invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("Cached entry for {key} does not match the result type: {reason}")]
    EntryMismatch { key: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error was raised while registering a function
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoParameters { .. }
                | Self::NotEnumerable { .. }
                | Self::EmptyDomain { .. }
                | Self::DuplicateParameter { .. }
                | Self::DuplicateValue { .. }
                | Self::DomainTooLarge { .. }
                | Self::InvalidFunctionName(_)
                | Self::DuplicateFunction(_)
                | Self::ConfigInvalid { .. }
        )
    }

    /// Whether a live call found no precomputed entry
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }

    /// Whether a later precomputation run may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Computation { .. } | Self::Timeout { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StoreCorrupt { .. } => {
                Some("Fix the JSON by hand or move the file aside; precache will not overwrite it")
            }
            Self::NotEnumerable { .. } => {
                Some("Declare the parameter as an enumeration or a literal value set")
            }
            Self::CacheMiss { .. } => Some("Run precomputation over the full domain first"),
            Self::ConfigInvalid { .. } => Some("Check the file with: precache config show"),
            _ => None,
        }
    }
}
