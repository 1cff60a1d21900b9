//! Error types for checkpoint operations

use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint exists for the requested task
    #[error("Checkpoint not found for task: {0}")]
    NotFound(String),

    /// Failed to serialize or deserialize checkpoint data
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backing store failure (database, network, etc.)
    #[error("Checkpoint storage error: {0}")]
    Storage(String),
}

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

impl From<serde_json::Error> for CheckpointError {
    fn from(err: serde_json::Error) -> Self {
        CheckpointError::Serialization(err.to_string())
    }
}
