//! Task model for database persistence

use crate::db::error::DbResult;
use crate::TaskState;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Entry in a task's append-only activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Agent that performed the action (e.g. "ResearchAgent")
    pub agent: String,

    /// Description of the action
    pub action: String,

    /// RFC3339 timestamp of the action
    pub timestamp: String,
}

impl LogEntry {
    /// Create a log entry stamped with the current time
    pub fn now(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Represents a task in the orchestrator database
///
/// Tasks are the unit of work: one row per submitted prompt, carrying the
/// lifecycle state, the final result or error, and an append-only activity
/// log serialized as a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique task identifier (UUID string)
    pub id: String,

    /// Original user prompt; immutable after creation
    pub prompt: String,

    /// Current lifecycle state (see [`TaskState`])
    pub status: String,

    /// Final output, present only when completed
    pub result: Option<String>,

    /// Failure diagnostic, present only when failed
    pub error: Option<String>,

    /// Append-only activity log as a JSON array string
    pub activity_log: String,

    /// Task creation timestamp (RFC3339 string)
    pub created_at: String,

    /// Task last update timestamp (RFC3339 string)
    pub updated_at: String,
}

impl Task {
    /// Parse the lifecycle state
    pub fn state(&self) -> DbResult<TaskState> {
        self.status
            .parse::<TaskState>()
            .map_err(|_| crate::db::DatabaseError::TypeError(format!(
                "Invalid task status in database: {}",
                self.status
            )))
    }

    /// Decode the activity log entries
    pub fn log_entries(&self) -> DbResult<Vec<LogEntry>> {
        Ok(serde_json::from_str(&self.activity_log)?)
    }
}
