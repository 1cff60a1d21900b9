//! Scribe server binary
//!
//! Standalone server wiring the stage graph engine to SQLite-backed stores,
//! the dispatcher worker pool, the observer broadcast plane, and the REST +
//! WebSocket surface.

use std::sync::Arc;

use orchestrator::agents::{LlmAnalyzer, LlmResearcher, LlmWriter};
use orchestrator::api::create_router;
use orchestrator::config::Settings;
use orchestrator::db::{DatabaseConnection, SqliteCheckpointer, SqliteScratchpad};
use orchestrator::dispatcher::{Dispatcher, DispatcherConfig, LifecycleObserver};
use orchestrator::events::EventBus;
use stagegraph::WorkflowEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let settings = Settings::from_env();
    tracing::info!("Database: {}", settings.database_url);
    tracing::info!("Workers: {}", settings.worker_count);

    // Database: records, checkpoints, and scratchpad workspaces
    let db = DatabaseConnection::new(&settings.database_url).await?;
    tracing::info!("Running database migrations");
    db.run_migrations().await?;
    db.health_check().await?;

    // LLM provider from the environment (openai or groq)
    let client = llm::client_from_env()?;

    // Observer broadcast plane
    let events = Arc::new(EventBus::new());

    // Engine over LLM-backed collaborators and durable stores
    let engine = Arc::new(
        WorkflowEngine::new(
            Arc::new(LlmAnalyzer::new(client.clone())),
            Arc::new(LlmResearcher::new(client.clone())),
            Arc::new(LlmWriter::new(client)),
            Arc::new(SqliteCheckpointer::new(db.clone())),
            Arc::new(SqliteScratchpad::new(db.clone())),
        )
        .with_observer(Arc::new(LifecycleObserver::new(db.clone(), events.clone()))),
    );

    // Background dispatcher
    let dispatcher = Dispatcher::start(
        DispatcherConfig {
            workers: settings.worker_count,
            ..Default::default()
        },
        db.clone(),
        engine,
        events.clone(),
    );

    let app = create_router(db, dispatcher, events);

    let addr = settings.server_addr()?;
    tracing::info!("Starting scribe server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Scribe server shut down gracefully");
    Ok(())
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
