//! Error types for stage graph execution

use checkpoint::CheckpointError;
use thiserror::Error;

/// Errors that can occur while executing a stage graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Prompt analysis failed (before the keyword fallback applied)
    #[error("Prompt analysis failed: {0}")]
    Analysis(String),

    /// Research collaborator failed after retries
    #[error("Research failed: {0}")]
    Research(String),

    /// Draft writer failed
    #[error("Draft generation failed: {0}")]
    Writing(String),

    /// Checkpoint store failure
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// No checkpoint exists for a task being resumed
    #[error("No checkpoint found for task: {0}")]
    CheckpointNotFound(String),

    /// Resume was requested but the checkpointed stage is not a suspension point
    #[error("Task {task_id} is not suspended (checkpointed stage: {stage})")]
    NotSuspended { task_id: String, stage: String },

    /// Scratchpad store failure
    #[error("Scratchpad error: {0}")]
    Scratchpad(String),

    /// Unknown stage name in a persisted checkpoint
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// State serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for stage graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
