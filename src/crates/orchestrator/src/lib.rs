//! Task orchestration for scribe
//!
//! This crate wires the stage graph engine to durable stores, runs engine
//! invocations on a worker pool off the request path, broadcasts lifecycle
//! events to subscribed observers, and exposes the REST + WebSocket surface.

pub mod agents;
pub mod api;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use db::DatabaseError;
use stagegraph::GraphError;

/// Errors that can occur during orchestration
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid lifecycle state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Unknown lifecycle state string
    #[error("Unknown task state: {0}")]
    UnknownState(String),

    /// Stage graph execution error
    #[error("Workflow execution failed: {0}")]
    Engine(#[from] GraphError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Command dispatch error
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Task lifecycle state
///
/// ```text
/// Pending -> Running -> Researching -> Writing -> AwaitingApproval
///                                                      |
///                                              approve |      reject
///                                                      v         v
///                                                  Resumed -> Completed
///                                                               or Failed
/// failures from any non-terminal -> Failed
/// ```
///
/// No transition leaves `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Created, not yet picked up by a worker
    Pending,
    /// Worker started the workflow
    Running,
    /// Research stage in progress
    Researching,
    /// Writing stage in progress
    Writing,
    /// Suspended, waiting for human approval
    AwaitingApproval,
    /// Approved; resume command enqueued
    Resumed,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl TaskState {
    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Researching => "RESEARCHING",
            TaskState::Writing => "WRITING",
            TaskState::AwaitingApproval => "AWAITING_APPROVAL",
            TaskState::Resumed => "RESUMED",
            TaskState::Completed => "COMPLETED",
            TaskState::Failed => "FAILED",
        }
    }

    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// Whether the lifecycle graph permits moving to `to`
    ///
    /// Terminal states permit nothing. `Failed` is reachable from every
    /// non-terminal state; `AwaitingApproval` only from `Writing`; `Resumed`
    /// only from `AwaitingApproval`; `Completed` only from `Resumed`.
    pub fn can_transition(&self, to: TaskState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == TaskState::Failed {
            return true;
        }
        matches!(
            (self, to),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Running, TaskState::Researching)
                | (TaskState::Researching, TaskState::Writing)
                | (TaskState::Writing, TaskState::AwaitingApproval)
                | (TaskState::AwaitingApproval, TaskState::Resumed)
                | (TaskState::Resumed, TaskState::Completed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(TaskState::Pending),
            "RUNNING" => Ok(TaskState::Running),
            "RESEARCHING" => Ok(TaskState::Researching),
            "WRITING" => Ok(TaskState::Writing),
            "AWAITING_APPROVAL" => Ok(TaskState::AwaitingApproval),
            "RESUMED" => Ok(TaskState::Resumed),
            "COMPLETED" => Ok(TaskState::Completed),
            "FAILED" => Ok(TaskState::Failed),
            other => Err(OrchestratorError::UnknownState(other.to_string())),
        }
    }
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
