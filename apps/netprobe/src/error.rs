//! Custom error types for netprobe
//!
//! This module provides a unified error type that can be used throughout
//! the application. Probe failures and stop requests are run outcomes, not
//! errors, and never show up here.

use thiserror::Error;

/// Main error type for netprobe operations
#[derive(Error, Debug)]
pub enum NetprobeError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Entity not found errors
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// A run was requested while another one is still in flight
    #[error("A probe run is already in progress")]
    AlreadyRunning,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors with a message
    #[error("{0}")]
    General(String),
}

impl NetprobeError {
    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using NetprobeError
pub type Result<T> = std::result::Result<T, NetprobeError>;
