//! Checkpoint data structure
//!
//! A checkpoint is the durable snapshot of a workflow paused at a stage
//! boundary. At most one live checkpoint exists per task; saving a new one
//! overwrites the previous snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable snapshot of workflow state at a stage boundary
///
/// The `state` payload is schema-agnostic: the workflow engine serializes its
/// own state type into a JSON value before saving, and deserializes it back
/// on resume. `resume_stage` names the stage to execute next.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Task this checkpoint belongs to
    pub task_id: String,

    /// Stage to execute when the workflow resumes
    pub resume_stage: String,

    /// Serialized workflow state
    pub state: serde_json::Value,

    /// Suspension descriptor, present only while the workflow is paused
    /// awaiting external input
    pub suspension: Option<serde_json::Value>,

    /// Checkpoint creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last overwrite timestamp
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a checkpoint at a stage boundary
    pub fn new(
        task_id: impl Into<String>,
        resume_stage: impl Into<String>,
        state: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            resume_stage: resume_stage.into(),
            state,
            suspension: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a suspension descriptor
    pub fn with_suspension(mut self, descriptor: serde_json::Value) -> Self {
        self.suspension = Some(descriptor);
        self
    }

    /// Whether this checkpoint represents a suspended workflow
    pub fn is_suspended(&self) -> bool {
        self.suspension.is_some()
    }
}
