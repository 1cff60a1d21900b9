//! Background command dispatcher
//!
//! Runs engine invocations off the request path on a fixed pool of worker
//! executors. Commands for the same task are serialized through a per-id
//! gate: a racing resume waits for the running executor rather than failing,
//! preserving submit-approve ordering across client races. Engine errors are
//! retried with bounded backoff; suspension is never a retry trigger.

use crate::db::repositories::{CheckpointRepository, TaskRepository, WorkspaceRepository};
use crate::db::DatabaseConnection;
use crate::events::{EventBus, TaskEvent};
use crate::{OrchestratorError, Result, TaskState};
use async_trait::async_trait;
use dashmap::DashMap;
use stagegraph::{
    ApprovalPayload, RetryPolicy, RunOutcome, Stage, StageObserver, WorkflowEngine,
    retry_with_backoff,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Command consumed by the worker pool
#[derive(Debug, Clone)]
pub enum Command {
    /// Begin a new workflow execution
    Run { task_id: String, prompt: String },
    /// Resume a suspended workflow with an approval decision
    Resume {
        task_id: String,
        payload: ApprovalPayload,
    },
}

impl Command {
    /// Task targeted by the command
    pub fn task_id(&self) -> &str {
        match self {
            Command::Run { task_id, .. } => task_id,
            Command::Resume { task_id, .. } => task_id,
        }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker executors
    pub workers: usize,
    /// Retry policy for whole engine invocations
    pub retry: RetryPolicy,
    /// Command queue depth
    pub queue_depth: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retry: RetryPolicy::default(),
            queue_depth: 256,
        }
    }
}

/// Shared state for worker executors
struct WorkerContext {
    db: DatabaseConnection,
    engine: Arc<WorkflowEngine>,
    events: Arc<EventBus>,
    gates: DashMap<String, Arc<Mutex<()>>>,
    retry: RetryPolicy,
}

/// Handle for enqueuing commands onto the worker pool
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Command>,
}

impl Dispatcher {
    /// Start the worker pool and return the enqueue handle
    pub fn start(
        config: DispatcherConfig,
        db: DatabaseConnection,
        engine: Arc<WorkflowEngine>,
        events: Arc<EventBus>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_depth);
        let rx = Arc::new(Mutex::new(rx));
        let ctx = Arc::new(WorkerContext {
            db,
            engine,
            events,
            gates: DashMap::new(),
            retry: config.retry,
        });

        for worker_id in 0..config.workers {
            let rx = Arc::clone(&rx);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                worker_loop(worker_id, rx, ctx).await;
            });
        }

        Self { tx }
    }

    /// Enqueue a command for background execution
    pub async fn enqueue(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|e| OrchestratorError::Dispatch(format!("command queue closed: {}", e)))
    }
}

/// Worker executor: drain commands until the queue closes
async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Command>>>,
    ctx: Arc<WorkerContext>,
) {
    debug!(worker_id, "Worker executor started");
    loop {
        let command = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(command) = command else {
            debug!(worker_id, "Command queue closed, worker exiting");
            return;
        };

        let task_id = command.task_id().to_string();

        // Per-task serialization gate: at most one executor runs a given
        // task id at a time; later commands wait their turn.
        let gate = ctx
            .gates
            .entry(task_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        handle_command(&ctx, command).await;
        ctx.gates.remove_if(&task_id, |_, gate| Arc::strong_count(gate) <= 2);
    }
}

async fn handle_command(ctx: &WorkerContext, command: Command) {
    match command {
        Command::Run { task_id, prompt } => {
            info!(%task_id, "Executing run command");
            match TaskRepository::transition(ctx.db.pool(), &task_id, TaskState::Running).await {
                Ok(_) => {
                    ctx.events
                        .broadcast(&task_id, TaskEvent::status(&task_id, TaskState::Running));
                    append_log(ctx, &task_id, "Orchestrator", "Starting workflow execution").await;
                }
                Err(e) => {
                    // A task rejected or failed before pickup stays terminal
                    warn!(%task_id, error = %e, "Skipping run command");
                    return;
                }
            }

            let engine = Arc::clone(&ctx.engine);
            let outcome = retry_with_backoff(&ctx.retry, "workflow_run", || {
                let engine = Arc::clone(&engine);
                let task_id = task_id.clone();
                let prompt = prompt.clone();
                async move { engine.run(&task_id, &prompt).await }
            })
            .await;
            handle_outcome(ctx, &task_id, outcome).await;
        }
        Command::Resume { task_id, payload } => {
            info!(%task_id, approved = payload.approved, "Executing resume command");
            append_log(
                ctx,
                &task_id,
                "Orchestrator",
                "Resuming workflow with approval decision",
            )
            .await;

            let engine = Arc::clone(&ctx.engine);
            let outcome = retry_with_backoff(&ctx.retry, "workflow_resume", || {
                let engine = Arc::clone(&engine);
                let task_id = task_id.clone();
                let payload = payload.clone();
                async move { engine.resume(&task_id, payload).await }
            })
            .await;
            handle_outcome(ctx, &task_id, outcome).await;
        }
    }
}

/// Map an engine outcome onto the task record, with log and broadcast
async fn handle_outcome(
    ctx: &WorkerContext,
    task_id: &str,
    outcome: std::result::Result<RunOutcome, stagegraph::GraphError>,
) {
    match outcome {
        Ok(RunOutcome::Suspended(_)) => {
            match TaskRepository::transition(ctx.db.pool(), task_id, TaskState::AwaitingApproval)
                .await
            {
                Ok(_) => {
                    append_log(ctx, task_id, "Orchestrator", "Awaiting human approval").await;
                    ctx.events.broadcast(
                        task_id,
                        TaskEvent::status(task_id, TaskState::AwaitingApproval),
                    );
                }
                Err(e) => error!(%task_id, error = %e, "Failed to mark task awaiting approval"),
            }
        }
        Ok(RunOutcome::Completed(state)) => {
            match TaskRepository::set_result(ctx.db.pool(), task_id, &state.result).await {
                Ok(_) => {
                    append_log(ctx, task_id, "Orchestrator", "Workflow completed").await;
                    ctx.events.broadcast(
                        task_id,
                        TaskEvent::status(task_id, TaskState::Completed)
                            .with_result(state.result.clone()),
                    );
                }
                Err(e) => error!(%task_id, error = %e, "Failed to record task result"),
            }
        }
        Ok(RunOutcome::Failed(message)) => {
            record_failure(ctx, task_id, &message).await;
        }
        Err(e) => {
            // Retries exhausted; the engine releases stores on graceful
            // terminal outcomes, but on an exception we must release here.
            let message = e.to_string();
            if let Err(e) = WorkspaceRepository::delete(ctx.db.pool(), task_id).await {
                error!(%task_id, error = %e, "Failed to release scratchpad");
            }
            if let Err(e) = CheckpointRepository::delete_by_task(ctx.db.pool(), task_id).await {
                error!(%task_id, error = %e, "Failed to release checkpoint");
            }
            record_failure(ctx, task_id, &message).await;
        }
    }
}

async fn record_failure(ctx: &WorkerContext, task_id: &str, message: &str) {
    match TaskRepository::set_error(ctx.db.pool(), task_id, message).await {
        Ok(_) => {
            append_log(
                ctx,
                task_id,
                "Orchestrator",
                &format!("Workflow failed: {}", message),
            )
            .await;
            ctx.events
                .broadcast(task_id, TaskEvent::status(task_id, TaskState::Failed));
        }
        Err(e) => error!(%task_id, error = %e, "Failed to record task failure"),
    }
}

async fn append_log(ctx: &WorkerContext, task_id: &str, agent: &str, action: &str) {
    if let Err(e) = TaskRepository::append_log(ctx.db.pool(), task_id, agent, action).await {
        error!(%task_id, error = %e, "Failed to append activity log entry");
    }
}

/// Orchestration glue between the engine and the task record
///
/// Translates stage boundaries into lifecycle transitions and agent actions
/// into activity-log entries, broadcasting both. Transitions rejected by the
/// state machine (stage re-execution after a crash) are ignored.
pub struct LifecycleObserver {
    db: DatabaseConnection,
    events: Arc<EventBus>,
}

impl LifecycleObserver {
    pub fn new(db: DatabaseConnection, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }
}

#[async_trait]
impl StageObserver for LifecycleObserver {
    async fn on_stage(&self, task_id: &str, stage: Stage) {
        let state = match stage {
            Stage::Research => TaskState::Researching,
            Stage::Writing => TaskState::Writing,
            // Approval and the terminal stages are recorded by the
            // dispatcher's outcome handling
            Stage::Approval | Stage::Finalize | Stage::Rejected => return,
        };

        match TaskRepository::transition(self.db.pool(), task_id, state).await {
            Ok(_) => {
                self.events
                    .broadcast(task_id, TaskEvent::status(task_id, state));
            }
            Err(e) if e.is_invalid_transition() => {
                debug!(%task_id, stage = %stage, "Skipping re-entrant stage transition");
            }
            Err(e) => error!(%task_id, error = %e, "Failed to record stage transition"),
        }
    }

    async fn on_agent_action(&self, task_id: &str, agent: &str, action: &str) {
        if let Err(e) = TaskRepository::append_log(self.db.pool(), task_id, agent, action).await {
            error!(%task_id, error = %e, "Failed to append agent action");
            return;
        }

        let state = TaskRepository::get_by_id(self.db.pool(), task_id)
            .await
            .ok()
            .flatten()
            .and_then(|task| task.state().ok())
            .unwrap_or(TaskState::Running);
        self.events
            .broadcast(task_id, TaskEvent::agent_action(task_id, state, agent, action));
    }
}
