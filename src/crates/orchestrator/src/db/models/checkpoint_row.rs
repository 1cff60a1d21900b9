//! Checkpoint row model for database persistence

use crate::db::error::{DatabaseError, DbResult};
use checkpoint::Checkpoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database representation of a workflow checkpoint
///
/// `state` and `suspension` hold JSON text; timestamps are RFC3339 strings.
/// One row per task: saves upsert on `task_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckpointRow {
    /// Task this checkpoint belongs to
    pub task_id: String,

    /// Stage to execute on resume
    pub resume_stage: String,

    /// Serialized workflow state (JSON text)
    pub state: String,

    /// Suspension descriptor (JSON text), present while suspended
    pub suspension: Option<String>,

    /// Creation timestamp (RFC3339 string)
    pub created_at: String,

    /// Last overwrite timestamp (RFC3339 string)
    pub updated_at: String,
}

impl CheckpointRow {
    /// Encode a checkpoint for storage
    pub fn from_checkpoint(cp: &Checkpoint) -> DbResult<Self> {
        Ok(Self {
            task_id: cp.task_id.clone(),
            resume_stage: cp.resume_stage.clone(),
            state: serde_json::to_string(&cp.state)?,
            suspension: cp
                .suspension
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            created_at: cp.created_at.to_rfc3339(),
            updated_at: cp.updated_at.to_rfc3339(),
        })
    }

    /// Decode a stored row back into a checkpoint
    pub fn into_checkpoint(self) -> DbResult<Checkpoint> {
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;

        Ok(Checkpoint {
            task_id: self.task_id,
            resume_stage: self.resume_stage,
            state: serde_json::from_str(&self.state)?,
            suspension: self
                .suspension
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(value: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::TypeError(format!("Invalid timestamp '{}': {}", value, e)))
}
