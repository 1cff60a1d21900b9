//! SQLite-backed implementations of the engine's store traits
//!
//! The engine depends on the `Checkpointer` and `Scratchpad` abstractions;
//! these adapters route them to the relational repositories so suspended
//! workflows survive a process restart.

use crate::db::connection::DatabaseConnection;
use crate::db::repositories::{CheckpointRepository, WorkspaceRepository};
use async_trait::async_trait;
use checkpoint::{Checkpoint, CheckpointError, Checkpointer};
use serde_json::Value;
use stagegraph::{GraphError, Scratchpad};

/// Checkpointer persisting snapshots in the `checkpoints` table
#[derive(Clone)]
pub struct SqliteCheckpointer {
    db: DatabaseConnection,
}

impl SqliteCheckpointer {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> checkpoint::Result<()> {
        CheckpointRepository::save(self.db.pool(), &checkpoint)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))
    }

    async fn load(&self, task_id: &str) -> checkpoint::Result<Option<Checkpoint>> {
        CheckpointRepository::get_by_task(self.db.pool(), task_id)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))
    }

    async fn delete(&self, task_id: &str) -> checkpoint::Result<()> {
        CheckpointRepository::delete_by_task(self.db.pool(), task_id)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))
    }
}

/// Scratchpad persisting workspaces in the `workspaces` table
#[derive(Clone)]
pub struct SqliteScratchpad {
    db: DatabaseConnection,
}

impl SqliteScratchpad {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Scratchpad for SqliteScratchpad {
    async fn save(&self, task_id: &str, patch: Value) -> stagegraph::Result<()> {
        if !patch.is_object() {
            return Err(GraphError::Scratchpad(
                "scratchpad patch must be a JSON object".to_string(),
            ));
        }
        WorkspaceRepository::save(self.db.pool(), task_id, &patch)
            .await
            .map_err(|e| GraphError::Scratchpad(e.to_string()))
    }

    async fn get(&self, task_id: &str) -> stagegraph::Result<Option<Value>> {
        WorkspaceRepository::get(self.db.pool(), task_id)
            .await
            .map_err(|e| GraphError::Scratchpad(e.to_string()))
    }

    async fn delete(&self, task_id: &str) -> stagegraph::Result<()> {
        WorkspaceRepository::delete(self.db.pool(), task_id)
            .await
            .map_err(|e| GraphError::Scratchpad(e.to_string()))
    }
}
