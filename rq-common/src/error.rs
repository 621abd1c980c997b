//! Common error types for RadioQuest

use thiserror::Error;

/// Common result type for RadioQuest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across RadioQuest services
///
/// Read paths recover from `BackendUnavailable` locally (mock data, no audio);
/// only `NotFound` and `InvalidInput` are expected to reach a client.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding of stored columns failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested segment absent from both store and fallback data
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store or narration backend not configured or not reachable
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Narration backend reachable but the synthesis call failed
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
