//! Error types for hcchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for hcchat operations
///
/// Generation, storage, and speech failures are all represented here so that
/// handlers can decide which of them are recovered locally and which are
/// reported to the user.
#[derive(Error, Debug)]
pub enum HcChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Conversation storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The durable session record exists but could not be decoded
    #[error("Malformed session record: {0}")]
    StorageParse(String),

    /// The generation endpoint answered with a non-success status
    #[error("Generation request failed with status {status}: {body}")]
    Request {
        /// HTTP status code returned by the endpoint
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The generation endpoint could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The generation endpoint answered with a body that is not the expected JSON
    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),

    /// Speech recognition failed while listening
    #[error("Speech recognition error: {0}")]
    Recognition(String),

    /// No speech recognizer is available
    #[error("Speech recognition is not supported")]
    SpeechUnsupported,

    /// Image input could not be read or is not a supported image
    #[error("Image error: {0}")]
    Image(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for hcchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
