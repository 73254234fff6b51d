//! Core error types for studydesk-core.
//!
//! Each layer gets its own thiserror enum; [`CoreError`] wraps them all so
//! callers can use `?` across layer boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studydesk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local cache errors
    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),

    /// Remote document store errors
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Local cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open the backing database
    #[error("Failed to open cache at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Read or write against the backing store failed
    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    /// Backing store is locked by another writer
    #[error("Cache is locked")]
    Locked,

    /// A value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Remote document store errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The store answered but refused the write
    #[error("Remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store is unreachable (offline host)
    #[error("Remote store unavailable")]
    Unavailable,

    /// Invalid endpoint URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Session shorter than one whole minute
    #[error("Session too short: {seconds}s is under one minute")]
    SessionTooShort { seconds: u64 },

    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must not precede start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    CacheError::Locked
                } else {
                    CacheError::QueryFailed(err.to_string())
                }
            }
            _ => CacheError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
