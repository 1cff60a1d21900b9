//! Scratchpad workspace repository
//!
//! Persists the per-task scratchpad under keys shaped `task:{id}:workspace`.
//! Saves shallow-merge into the existing object and refresh the 24-hour TTL;
//! expiry is enforced on read.

use crate::db::connection::DatabasePool;
use crate::db::error::DbResult;
use crate::db::models::WorkspaceRow;
use chrono::{Duration, Utc};
use serde_json::Value;
use stagegraph::store::{merge_objects, workspace_key};

/// Entry lifetime in seconds (24 hours)
pub const WORKSPACE_TTL_SECS: i64 = 86_400;

/// Workspace repository for scratchpad persistence
pub struct WorkspaceRepository;

impl WorkspaceRepository {
    /// Merge a patch into the task's workspace and refresh its TTL
    pub async fn save(pool: &DatabasePool, task_id: &str, patch: &Value) -> DbResult<()> {
        let key = workspace_key(task_id);
        let now = Utc::now();
        let expires_at = (now + Duration::seconds(WORKSPACE_TTL_SECS)).to_rfc3339();

        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT * FROM workspaces WHERE key = ?",
        )
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await?;

        let mut value = match existing {
            Some(row) if !row.is_expired() => serde_json::from_str(&row.value)?,
            _ => Value::Object(Default::default()),
        };
        merge_objects(&mut value, patch.clone());

        sqlx::query(
            "INSERT INTO workspaces (key, value, expires_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&key)
        .bind(serde_json::to_string(&value)?)
        .bind(&expires_at)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch the task's workspace object, if present and unexpired
    ///
    /// Expired entries are purged on read.
    pub async fn get(pool: &DatabasePool, task_id: &str) -> DbResult<Option<Value>> {
        let key = workspace_key(task_id);
        let row = sqlx::query_as::<_, WorkspaceRow>("SELECT * FROM workspaces WHERE key = ?")
            .bind(&key)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) if !row.is_expired() => Ok(Some(serde_json::from_str(&row.value)?)),
            Some(_) => {
                Self::delete(pool, task_id).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Remove the task's workspace
    pub async fn delete(pool: &DatabasePool, task_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM workspaces WHERE key = ?")
            .bind(workspace_key(task_id))
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove every expired workspace entry; returns the number purged
    pub async fn purge_expired(pool: &DatabasePool) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM workspaces WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseConnection;
    use serde_json::json;

    async fn test_pool() -> DatabaseConnection {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let conn = test_pool().await;
        WorkspaceRepository::save(conn.pool(), "t1", &json!({"topics": ["Redis"]}))
            .await
            .unwrap();

        let value = WorkspaceRepository::get(conn.pool(), "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["topics"][0], "Redis");
    }

    #[tokio::test]
    async fn test_save_shallow_merges() {
        let conn = test_pool().await;
        WorkspaceRepository::save(
            conn.pool(),
            "t1",
            &json!({"topics": ["Redis"], "task_type": "summary"}),
        )
        .await
        .unwrap();
        WorkspaceRepository::save(conn.pool(), "t1", &json!({"task_type": "comparison"}))
            .await
            .unwrap();

        let value = WorkspaceRepository::get(conn.pool(), "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["task_type"], "comparison");
        assert_eq!(value["topics"][0], "Redis");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let conn = test_pool().await;
        assert!(WorkspaceRepository::get(conn.pool(), "ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let conn = test_pool().await;
        WorkspaceRepository::save(conn.pool(), "t1", &json!({"a": 1}))
            .await
            .unwrap();
        WorkspaceRepository::delete(conn.pool(), "t1").await.unwrap();

        assert!(WorkspaceRepository::get(conn.pool(), "t1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_purged_on_read() {
        let conn = test_pool().await;
        let key = workspace_key("t1");
        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();

        sqlx::query(
            "INSERT INTO workspaces (key, value, expires_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&key)
        .bind("{\"stale\": true}")
        .bind(&past)
        .bind(&past)
        .execute(conn.pool())
        .await
        .unwrap();

        assert!(WorkspaceRepository::get(conn.pool(), "t1")
            .await
            .unwrap()
            .is_none());

        // The stale row is gone
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM workspaces")
            .fetch_one(conn.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let conn = test_pool().await;
        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();

        sqlx::query(
            "INSERT INTO workspaces (key, value, expires_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind("task:stale:workspace")
        .bind("{}")
        .bind(&past)
        .bind(&past)
        .execute(conn.pool())
        .await
        .unwrap();
        WorkspaceRepository::save(conn.pool(), "fresh", &json!({"a": 1}))
            .await
            .unwrap();

        let purged = WorkspaceRepository::purge_expired(conn.pool()).await.unwrap();
        assert_eq!(purged, 1);
        assert!(WorkspaceRepository::get(conn.pool(), "fresh")
            .await
            .unwrap()
            .is_some());
    }
}
