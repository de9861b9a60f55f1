//! Error types for Agora
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Agora operations
///
/// This enum encompasses all possible errors that can occur during
/// session management, turn polling, personality uploads, and
/// configuration loading.
#[derive(Error, Debug)]
pub enum AgoraError {
    /// Malformed local input, rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Start or next-turn transport/service failure
    #[error("Operation error: {0}")]
    Operation(String),

    /// Upload or analysis rejected by the remote service
    ///
    /// Carries the `detail` message from the service verbatim.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Agora operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
