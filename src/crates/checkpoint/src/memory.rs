//! In-memory checkpointer implementation
//!
//! Suitable for tests and single-process deployments that do not need
//! snapshots to survive a restart.

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::traits::Checkpointer;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// Checkpointer backed by a process-local map
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointer {
    /// Create an empty in-memory checkpointer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live checkpoints
    pub fn len(&self) -> usize {
        self.checkpoints.lock().unwrap().len()
    }

    /// Whether no checkpoints are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, mut checkpoint: Checkpoint) -> Result<()> {
        let mut map = self.checkpoints.lock().unwrap();
        if let Some(existing) = map.get(&checkpoint.task_id) {
            checkpoint.created_at = existing.created_at;
        }
        checkpoint.updated_at = Utc::now();
        map.insert(checkpoint.task_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.lock().unwrap().get(task_id).cloned())
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        self.checkpoints.lock().unwrap().remove(task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryCheckpointer::new();
        let cp = Checkpoint::new("task-1", "research", json!({"prompt": "p"}));

        store.save(cp.clone()).await.unwrap();
        let loaded = store.load("task-1").await.unwrap().unwrap();

        assert_eq!(loaded.task_id, "task-1");
        assert_eq!(loaded.resume_stage, "research");
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = MemoryCheckpointer::new();

        store
            .save(Checkpoint::new("task-1", "research", json!({})))
            .await
            .unwrap();
        store
            .save(Checkpoint::new("task-1", "writing", json!({"draft": "d"})))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.load("task-1").await.unwrap().unwrap();
        assert_eq!(loaded.resume_stage, "writing");
    }

    #[tokio::test]
    async fn test_overwrite_preserves_created_at() {
        let store = MemoryCheckpointer::new();
        store
            .save(Checkpoint::new("task-1", "research", json!({})))
            .await
            .unwrap();
        let first = store.load("task-1").await.unwrap().unwrap();

        store
            .save(Checkpoint::new("task-1", "writing", json!({})))
            .await
            .unwrap();
        let second = store.load("task-1").await.unwrap().unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = MemoryCheckpointer::new();
        assert!(store.load("no-such-task").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryCheckpointer::new();
        store
            .save(Checkpoint::new("task-1", "approval", json!({})))
            .await
            .unwrap();

        store.delete("task-1").await.unwrap();
        assert!(store.load("task-1").await.unwrap().is_none());

        // Deleting again is a no-op
        store.delete("task-1").await.unwrap();
    }
}
