//! Checkpointer trait abstraction
//!
//! Backends implement [`Checkpointer`] to persist workflow snapshots. The
//! engine only relies on three operations: overwrite-save, load-latest, and
//! delete. Implementations must make `save` atomic per task id so that a
//! reader never observes a half-written checkpoint.

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use async_trait::async_trait;

/// Storage backend for workflow checkpoints
///
/// At most one live checkpoint exists per task id; `save` replaces any
/// previous snapshot for the same task.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Save a checkpoint, overwriting any existing one for the task
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Load the live checkpoint for a task, if any
    async fn load(&self, task_id: &str) -> Result<Option<Checkpoint>>;

    /// Delete the checkpoint for a task
    ///
    /// Deleting a task with no checkpoint is not an error.
    async fn delete(&self, task_id: &str) -> Result<()>;
}
