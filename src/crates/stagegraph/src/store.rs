//! Scratchpad store for inter-stage artifacts
//!
//! The scratchpad is a per-task key/value area that stages use to pass
//! intermediate artifacts across possible process restarts. It is not
//! authoritative (checkpoints are) but lets the writing stage avoid
//! re-running research after a checkpoint restore. Entries live until the
//! task terminates or a 24-hour TTL elapses, whichever is first.

use crate::error::{GraphError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime: 24 hours
pub const SCRATCHPAD_TTL: Duration = Duration::from_secs(86_400);

/// Per-task scratchpad storage
///
/// Values are JSON objects; `save` shallow-merges the patch into the
/// existing object and refreshes the TTL.
#[async_trait]
pub trait Scratchpad: Send + Sync {
    /// Merge a patch into the task's scratchpad object
    async fn save(&self, task_id: &str, patch: Value) -> Result<()>;

    /// Fetch the task's scratchpad object, if present and unexpired
    async fn get(&self, task_id: &str) -> Result<Option<Value>>;

    /// Remove the task's scratchpad object
    async fn delete(&self, task_id: &str) -> Result<()>;
}

/// Storage key for a task's scratchpad entry
pub fn workspace_key(task_id: &str) -> String {
    format!("task:{}:workspace", task_id)
}

/// Shallow-merge `patch` into `base`; both must be JSON objects
///
/// Non-object bases are replaced wholesale.
pub fn merge_objects(base: &mut Value, patch: Value) {
    match (base.as_object_mut(), patch) {
        (Some(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                base_map.insert(key, value);
            }
        }
        (_, patch) => *base = patch,
    }
}

/// Scratchpad backed by a process-local map with TTL enforcement on read
#[derive(Debug)]
pub struct MemoryScratchpad {
    entries: Mutex<HashMap<String, (Value, Instant)>>,
    ttl: Duration,
}

impl MemoryScratchpad {
    /// Create a scratchpad with the default 24-hour TTL
    pub fn new() -> Self {
        Self::with_ttl(SCRATCHPAD_TTL)
    }

    /// Create a scratchpad with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemoryScratchpad {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scratchpad for MemoryScratchpad {
    async fn save(&self, task_id: &str, patch: Value) -> Result<()> {
        if !patch.is_object() {
            return Err(GraphError::Scratchpad(
                "scratchpad patch must be a JSON object".to_string(),
            ));
        }

        let key = workspace_key(task_id);
        let mut entries = self.entries.lock().unwrap();
        let expiry = Instant::now() + self.ttl;

        match entries.get_mut(&key) {
            Some((existing, expires_at)) if *expires_at > Instant::now() => {
                merge_objects(existing, patch);
                *expires_at = expiry;
            }
            _ => {
                entries.insert(key, (patch, expiry));
            }
        }
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<Value>> {
        let key = workspace_key(task_id);
        let mut entries = self.entries.lock().unwrap();

        match entries.get(&key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(value.clone()))
            }
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(&workspace_key(task_id));
        Ok(())
    }
}
