//! API request and response models

use crate::api::error::{ApiError, ApiResult};
use crate::db::models::{LogEntry, Task};
use serde::{Deserialize, Serialize};

/// Request to submit a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// The user's prompt
    pub prompt: String,
}

impl CreateTaskRequest {
    /// Validate the submission
    pub fn validate(&self) -> ApiResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Response to a task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateResponse {
    /// Identifier of the created task
    pub task_id: String,
    /// Initial lifecycle state
    pub status: String,
}

/// Request to approve or reject a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskApproveRequest {
    /// Approval decision
    pub approved: bool,
    /// Optional reviewer feedback
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Response to an approval decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskApproveResponse {
    /// Task the decision applied to
    pub task_id: String,
    /// Resulting lifecycle state
    pub status: String,
}

/// Full task representation returned by GET
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub prompt: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub activity_log: Vec<LogEntry>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskResponse {
    /// Build the response from a database row
    pub fn from_task(task: Task) -> ApiResult<Self> {
        let activity_log = task
            .log_entries()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(Self {
            id: task.id,
            prompt: task.prompt,
            status: task.status,
            result: task.result,
            error: task.error,
            activity_log,
            created_at: task.created_at,
            updated_at: task.updated_at,
        })
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
