//! Task repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::error::{DatabaseError, DbResult};
use crate::db::models::{LogEntry, Task};
use crate::TaskState;
use chrono::Utc;

/// Task repository for managing task database operations
pub struct TaskRepository;

impl TaskRepository {
    /// Create a new task in PENDING state
    ///
    /// # Arguments
    /// * `pool` - Database connection pool
    /// * `id` - Unique task identifier
    /// * `prompt` - The user's prompt
    ///
    /// # Returns
    /// Created task or database error
    pub async fn create(pool: &DatabasePool, id: String, prompt: String) -> DbResult<Task> {
        let now = Utc::now().to_rfc3339();
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, prompt, status, activity_log, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(&prompt)
        .bind(TaskState::Pending.as_str())
        .bind("[]")
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Get a task by ID
    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> DbResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(task)
    }

    /// Get all tasks, newest first
    pub async fn list(pool: &DatabasePool) -> DbResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;
        Ok(tasks)
    }

    /// List tasks by lifecycle state
    pub async fn list_by_state(pool: &DatabasePool, state: TaskState) -> DbResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE status = ? ORDER BY created_at DESC",
        )
        .bind(state.as_str())
        .fetch_all(pool)
        .await?;
        Ok(tasks)
    }

    /// Transition a task to a new lifecycle state
    ///
    /// Validated against the state machine inside a single-row transaction.
    /// Re-asserting the current state is a no-op that still touches
    /// `updated_at`, which keeps stage re-execution after a crash safe.
    ///
    /// # Returns
    /// The updated task, or an error if the task is missing or the
    /// transition is not permitted.
    pub async fn transition(pool: &DatabasePool, id: &str, to: TaskState) -> DbResult<Task> {
        let mut tx = pool.begin().await?;
        let current = Self::current_state(&mut tx, id).await?;

        if current != to && !current.can_transition(to) {
            return Err(DatabaseError::InvalidTransition {
                task_id: id.to_string(),
                from: current.to_string(),
                to: to.to_string(),
            });
        }

        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(to.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Record the final result and mark the task completed
    ///
    /// Only valid from RESUMED; the state machine is enforced in the same
    /// transaction as the write.
    pub async fn set_result(pool: &DatabasePool, id: &str, result: &str) -> DbResult<Task> {
        let mut tx = pool.begin().await?;
        let current = Self::current_state(&mut tx, id).await?;

        if !current.can_transition(TaskState::Completed) {
            return Err(DatabaseError::InvalidTransition {
                task_id: id.to_string(),
                from: current.to_string(),
                to: TaskState::Completed.to_string(),
            });
        }

        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = ?, result = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(TaskState::Completed.as_str())
        .bind(result)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Record a failure diagnostic and mark the task failed
    ///
    /// Valid from any non-terminal state.
    pub async fn set_error(pool: &DatabasePool, id: &str, error: &str) -> DbResult<Task> {
        let mut tx = pool.begin().await?;
        let current = Self::current_state(&mut tx, id).await?;

        if !current.can_transition(TaskState::Failed) {
            return Err(DatabaseError::InvalidTransition {
                task_id: id.to_string(),
                from: current.to_string(),
                to: TaskState::Failed.to_string(),
            });
        }

        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = ?, error = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(TaskState::Failed.as_str())
        .bind(error)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Append an entry to the task's activity log
    ///
    /// The log is append-only: entries are never reordered or removed.
    pub async fn append_log(
        pool: &DatabasePool,
        id: &str,
        agent: &str,
        action: &str,
    ) -> DbResult<()> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("task {}", id)))?;

        let mut entries: Vec<LogEntry> = serde_json::from_str(&task.activity_log)?;
        entries.push(LogEntry::now(agent, action));

        sqlx::query("UPDATE tasks SET activity_log = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&entries)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn current_state(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
    ) -> DbResult<TaskState> {
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        let (status,) = status.ok_or_else(|| DatabaseError::not_found(format!("task {}", id)))?;
        status
            .parse::<TaskState>()
            .map_err(|_| DatabaseError::TypeError(format!("Invalid status in database: {}", status)))
    }
}
