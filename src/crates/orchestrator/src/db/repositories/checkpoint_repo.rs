//! Checkpoint repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::error::DbResult;
use crate::db::models::CheckpointRow;
use checkpoint::Checkpoint;
use chrono::Utc;

/// Checkpoint repository for managing workflow snapshot persistence
///
/// One row per task; `save` upserts so the overwrite is atomic and at most
/// one live checkpoint exists per task at any time.
pub struct CheckpointRepository;

impl CheckpointRepository {
    /// Save a checkpoint, replacing any existing one for the task
    pub async fn save(pool: &DatabasePool, cp: &Checkpoint) -> DbResult<()> {
        let row = CheckpointRow::from_checkpoint(cp)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO checkpoints (task_id, resume_stage, state, suspension, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(task_id) DO UPDATE SET
                 resume_stage = excluded.resume_stage,
                 state = excluded.state,
                 suspension = excluded.suspension,
                 updated_at = excluded.updated_at",
        )
        .bind(&row.task_id)
        .bind(&row.resume_stage)
        .bind(&row.state)
        .bind(&row.suspension)
        .bind(&row.created_at)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the live checkpoint for a task
    pub async fn get_by_task(pool: &DatabasePool, task_id: &str) -> DbResult<Option<Checkpoint>> {
        let row = sqlx::query_as::<_, CheckpointRow>(
            "SELECT * FROM checkpoints WHERE task_id = ?",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        row.map(CheckpointRow::into_checkpoint).transpose()
    }

    /// Delete the checkpoint for a task
    pub async fn delete_by_task(pool: &DatabasePool, task_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM checkpoints WHERE task_id = ?")
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Count live checkpoints
    pub async fn count(pool: &DatabasePool) -> DbResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM checkpoints")
            .fetch_one(pool)
            .await?;
        Ok(result.0)
    }
}
