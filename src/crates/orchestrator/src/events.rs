//! Observer broadcast plane
//!
//! Observers subscribe per task id and receive a structured event on every
//! lifecycle transition. Registration, deregistration, and the
//! snapshot-for-broadcast all happen under a single mutex; delivery runs
//! outside the lock so a slow receiver never blocks registration. Delivery
//! is best-effort: channels whose receiver is gone are dropped silently.

use crate::TaskState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Pseudo-status of the confirmation event sent on subscription
pub const SUBSCRIBED_STATUS: &str = "SUBSCRIBED";

/// Structured lifecycle event delivered to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Task the event concerns
    pub task_id: String,

    /// Lifecycle state (or [`SUBSCRIBED_STATUS`] for the confirmation)
    pub status: String,

    /// Final result, present on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Agent that acted, present on activity events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    /// Action description, present on activity events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl TaskEvent {
    /// Event for a lifecycle transition
    pub fn status(task_id: impl Into<String>, state: TaskState) -> Self {
        Self {
            task_id: task_id.into(),
            status: state.as_str().to_string(),
            result: None,
            agent_name: None,
            action: None,
        }
    }

    /// Attach the final result
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Event for an agent action
    pub fn agent_action(
        task_id: impl Into<String>,
        state: TaskState,
        agent: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: state.as_str().to_string(),
            result: None,
            agent_name: Some(agent.into()),
            action: Some(action.into()),
        }
    }

    fn subscribed(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: SUBSCRIBED_STATUS.to_string(),
            result: None,
            agent_name: None,
            action: None,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
pub struct Subscription {
    /// Registration id, used to unsubscribe
    pub id: u64,
    /// Subscribed task
    pub task_id: String,
    /// Delivery channel
    pub rx: UnboundedReceiver<TaskEvent>,
}

/// Registry of per-task observer channels
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<String, Vec<(u64, UnboundedSender<TaskEvent>)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for a task
    ///
    /// A confirmation event is delivered first on the returned channel.
    pub fn subscribe(&self, task_id: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Confirmation goes out before the channel is visible to broadcasts,
        // so it is always the first event an observer sees.
        let _ = tx.send(TaskEvent::subscribed(task_id));

        self.subscribers
            .lock()
            .entry(task_id.to_string())
            .or_default()
            .push((id, tx));

        Subscription {
            id,
            task_id: task_id.to_string(),
            rx,
        }
    }

    /// Remove an observer registration
    pub fn unsubscribe(&self, task_id: &str, id: u64) {
        let mut subscribers = self.subscribers.lock();
        if let Some(channels) = subscribers.get_mut(task_id) {
            channels.retain(|(channel_id, _)| *channel_id != id);
            if channels.is_empty() {
                subscribers.remove(task_id);
            }
        }
    }

    /// Deliver an event to every observer of the task
    ///
    /// The sender set is snapshotted under the lock and delivery happens
    /// outside it. Channels that fail to accept the event are pruned.
    pub fn broadcast(&self, task_id: &str, event: TaskEvent) {
        let snapshot: Vec<(u64, UnboundedSender<TaskEvent>)> = {
            let subscribers = self.subscribers.lock();
            match subscribers.get(task_id) {
                Some(channels) => channels.clone(),
                None => return,
            }
        };

        let mut dead: Vec<u64> = Vec::new();
        for (id, tx) in &snapshot {
            if tx.send(event.clone()).is_err() {
                dead.push(*id);
            }
        }

        for id in dead {
            self.unsubscribe(task_id, id);
        }
    }

    /// Number of observers registered for a task
    pub fn subscriber_count(&self, task_id: &str) -> usize {
        self.subscribers
            .lock()
            .get(task_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirmation_event_first() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe("t1");

        let first = sub.rx.recv().await.unwrap();
        assert_eq!(first.status, SUBSCRIBED_STATUS);
        assert_eq!(first.task_id, "t1");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe("t1");
        let mut b = bus.subscribe("t1");

        bus.broadcast("t1", TaskEvent::status("t1", TaskState::Running));

        // Skip confirmations
        a.rx.recv().await.unwrap();
        b.rx.recv().await.unwrap();

        assert_eq!(a.rx.recv().await.unwrap().status, "RUNNING");
        assert_eq!(b.rx.recv().await.unwrap().status, "RUNNING");
    }

    #[tokio::test]
    async fn test_broadcast_scoped_to_task() {
        let bus = EventBus::new();
        let mut a = bus.subscribe("t1");
        let mut b = bus.subscribe("t2");

        bus.broadcast("t1", TaskEvent::status("t1", TaskState::Completed));

        a.rx.recv().await.unwrap(); // confirmation
        assert_eq!(a.rx.recv().await.unwrap().status, "COMPLETED");

        b.rx.recv().await.unwrap(); // confirmation
        assert!(b.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let sub = bus.subscribe("t1");
        assert_eq!(bus.subscriber_count("t1"), 1);

        bus.unsubscribe("t1", sub.id);
        assert_eq!(bus.subscriber_count("t1"), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_pruned_on_broadcast() {
        let bus = EventBus::new();
        let sub = bus.subscribe("t1");
        drop(sub.rx);

        bus.broadcast("t1", TaskEvent::status("t1", TaskState::Running));
        assert_eq!(bus.subscriber_count("t1"), 0);
    }

    #[tokio::test]
    async fn test_event_serialization_omits_empty_fields() {
        let event = TaskEvent::status("t1", TaskState::Failed);
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("FAILED"));
        assert!(!json.contains("result"));
        assert!(!json.contains("agent_name"));

        let with_result =
            TaskEvent::status("t1", TaskState::Completed).with_result("final text");
        let json = serde_json::to_string(&with_result).unwrap();
        assert!(json.contains("final text"));
    }
}
