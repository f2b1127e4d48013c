//! Core error types for donebot-core.
//!
//! User-input failures ([`TaskError`]) are turned into chat replies by the
//! interpreter and never abort a run. Everything else propagates out of
//! [`crate::Orchestrator::run_once`] and ends the invocation; the next
//! scheduled run is the retry.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for donebot-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Messaging provider errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persisted blob errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task registry errors raised outside the chat interpreter (CLI admin)
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Expected user-input failures. The `Display` text is the reply sent back
/// to the chat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Invalid task key: {0}. Keys use a-z, 0-9, _ or - (max 32).")]
    InvalidKey(String),

    #[error("Label cannot be empty.")]
    EmptyLabel,

    #[error("Task already exists: {0}.")]
    DuplicateKey(String),

    #[error("Unknown task: {0}. Send /tasks to see the list.")]
    UnknownKey(String),

    #[error("No default task set. Use /default <key> or /done <key>.")]
    NoDefaultTask,
}

/// Messaging provider failures: network, timeout, non-2xx, `ok: false`.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failure, timeout, or undecodable body
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response
    #[error("{method} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },

    /// 2xx response whose envelope says `ok: false`
    #[error("{method} rejected by API: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    /// The blocking runtime backing the HTTP client could not start
    #[error("failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Persisted blob errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blob exists but does not decode
    #[error("Blob '{name}' is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },
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

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
