//! Task endpoint handlers
//!
//! Submit, inspect, and approve tasks. Handlers never run the workflow
//! themselves: they touch the task record and enqueue dispatcher commands.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use stagegraph::ApprovalPayload;
use uuid::Uuid;

use crate::api::{
    error::{ApiError, ApiResult},
    models::{
        CreateTaskRequest, TaskApproveRequest, TaskApproveResponse, TaskCreateResponse,
        TaskResponse,
    },
    routes::AppState,
};
use crate::db::repositories::{CheckpointRepository, TaskRepository, WorkspaceRepository};
use crate::dispatcher::Command;
use crate::events::TaskEvent;
use crate::TaskState;

/// Submit a new task
///
/// POST /api/v1/tasks
///
/// Persists a PENDING record and enqueues the run command; the workflow
/// executes out-of-band, so this returns 202 Accepted immediately.
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskCreateResponse>)> {
    request.validate()?;

    let task_id = Uuid::new_v4().to_string();
    let task = TaskRepository::create(state.db.pool(), task_id.clone(), request.prompt.clone())
        .await?;

    state
        .dispatcher
        .enqueue(Command::Run {
            task_id: task_id.clone(),
            prompt: request.prompt,
        })
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!(%task_id, "Task submitted");
    Ok((
        StatusCode::ACCEPTED,
        Json(TaskCreateResponse {
            task_id,
            status: task.status,
        }),
    ))
}

/// Get task status and details
///
/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let task = TaskRepository::get_by_id(state.db.pool(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task with id {} not found", id)))?;

    Ok(Json(TaskResponse::from_task(task)?))
}

/// Approve or reject a draft awaiting review
///
/// POST /api/v1/tasks/:id/approve
///
/// Only valid while the task is AWAITING_APPROVAL. Approval marks the task
/// RESUMED and enqueues the resume command; rejection marks it FAILED with
/// the feedback as the diagnostic and enqueues nothing.
pub async fn approve_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TaskApproveRequest>,
) -> ApiResult<Json<TaskApproveResponse>> {
    let task = TaskRepository::get_by_id(state.db.pool(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task with id {} not found", id)))?;

    let current = task
        .state()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if current != TaskState::AwaitingApproval {
        return Err(ApiError::BadRequest(format!(
            "Task is not awaiting approval (current status: {})",
            task.status
        )));
    }

    let feedback = request.feedback.unwrap_or_default();

    let status = if request.approved {
        let task = TaskRepository::transition(state.db.pool(), &id, TaskState::Resumed).await?;
        TaskRepository::append_log(state.db.pool(), &id, "Orchestrator", "Draft approved").await?;
        state
            .events
            .broadcast(&id, TaskEvent::status(&id, TaskState::Resumed));

        state
            .dispatcher
            .enqueue(Command::Resume {
                task_id: id.clone(),
                payload: ApprovalPayload {
                    approved: true,
                    feedback,
                },
            })
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        tracing::info!(task_id = %id, "Draft approved, resume enqueued");
        task.status
    } else {
        // Rejection is terminal at the API: no resume is enqueued, and the
        // stores are released here since no executor will run again.
        let error = if feedback.is_empty() {
            "Draft was rejected".to_string()
        } else {
            feedback
        };
        let task = TaskRepository::set_error(state.db.pool(), &id, &error).await?;
        TaskRepository::append_log(
            state.db.pool(),
            &id,
            "Orchestrator",
            &format!("Draft rejected: {}", error),
        )
        .await?;
        WorkspaceRepository::delete(state.db.pool(), &id).await?;
        CheckpointRepository::delete_by_task(state.db.pool(), &id).await?;
        state
            .events
            .broadcast(&id, TaskEvent::status(&id, TaskState::Failed));

        tracing::info!(task_id = %id, "Draft rejected");
        task.status
    };

    Ok(Json(TaskApproveResponse {
        task_id: id,
        status,
    }))
}
