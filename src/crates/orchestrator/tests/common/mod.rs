//! Shared test harness: in-memory database, mock collaborators, and a fast
//! dispatcher wired exactly like the production server.

use async_trait::async_trait;
use axum::Router;
use llm::ChatClient;
use orchestrator::agents::LlmWriter;
use orchestrator::api::create_router;
use orchestrator::db::{DatabaseConnection, SqliteCheckpointer, SqliteScratchpad};
use orchestrator::dispatcher::{Dispatcher, DispatcherConfig, LifecycleObserver};
use orchestrator::events::EventBus;
use orchestrator::TaskState;
use stagegraph::{
    keyword_analysis, Analysis, PromptAnalyzer, Researcher, RetryPolicy, WorkflowEngine,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic analyzer backed by the keyword heuristics
pub struct KeywordAnalyzer;

#[async_trait]
impl PromptAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, prompt: &str) -> stagegraph::Result<Analysis> {
        Ok(keyword_analysis(prompt))
    }
}

/// Researcher producing canned findings per query
pub struct EchoResearcher;

#[async_trait]
impl Researcher for EchoResearcher {
    async fn research(&self, query: &str) -> stagegraph::Result<String> {
        Ok(format!("Detailed findings about {}", query))
    }
}

/// Researcher that fails the first call for each distinct query
pub struct FlakyResearcher {
    calls: Mutex<HashMap<String, u32>>,
}

impl FlakyResearcher {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Researcher for FlakyResearcher {
    async fn research(&self, query: &str) -> stagegraph::Result<String> {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(query.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            Err(stagegraph::GraphError::Research(
                "simulated transient failure".to_string(),
            ))
        } else {
            Ok(format!("Recovered findings about {}", query))
        }
    }
}

/// Chat client that echoes the rendered request back as the completion
///
/// Drives the real `LlmWriter` without a network: drafts carry the selected
/// writing template plus the substituted research context and prompt, so
/// tests can assert on final result content.
pub struct EchoChatClient;

#[async_trait]
impl ChatClient for EchoChatClient {
    async fn complete(&self, prompt: &str, _temperature: f32) -> llm::Result<String> {
        Ok(prompt.to_string())
    }
}

/// Fully wired application over mocks, mirroring the server binary
pub struct TestApp {
    pub db: DatabaseConnection,
    pub events: Arc<EventBus>,
    pub dispatcher: Dispatcher,
    pub router: Router,
}

/// Millisecond-scale retries so failure paths stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3).with_min_delay(1).with_max_delay(10)
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(EchoResearcher)).await
}

pub async fn spawn_app_with(researcher: Arc<dyn Researcher>) -> TestApp {
    // A single connection keeps the in-memory database consistent across
    // the pool.
    let db = DatabaseConnection::with_max_connections("sqlite::memory:", 1)
        .await
        .expect("database");
    db.run_migrations().await.expect("migrations");

    let events = Arc::new(EventBus::new());
    let engine = Arc::new(
        WorkflowEngine::new(
            Arc::new(KeywordAnalyzer),
            researcher,
            Arc::new(LlmWriter::new(Arc::new(EchoChatClient))),
            Arc::new(SqliteCheckpointer::new(db.clone())),
            Arc::new(SqliteScratchpad::new(db.clone())),
        )
        .with_retry_policy(fast_retry())
        .with_observer(Arc::new(LifecycleObserver::new(db.clone(), events.clone()))),
    );

    let dispatcher = Dispatcher::start(
        DispatcherConfig {
            workers: 2,
            retry: fast_retry(),
            queue_depth: 16,
        },
        db.clone(),
        engine,
        events.clone(),
    );

    let router = create_router(db.clone(), dispatcher.clone(), events.clone());

    TestApp {
        db,
        events,
        dispatcher,
        router,
    }
}

/// Poll the task record until it reaches the expected state
pub async fn wait_for_state(db: &DatabaseConnection, task_id: &str, expected: TaskState) {
    use orchestrator::db::repositories::TaskRepository;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = TaskRepository::get_by_id(db.pool(), task_id)
            .await
            .expect("task query")
            .expect("task exists");
        if task.status == expected.as_str() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {} (currently {})",
            expected,
            task.status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
