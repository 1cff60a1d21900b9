//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{handlers, ws};
use crate::db::DatabaseConnection;
use crate::dispatcher::Dispatcher;
use crate::events::EventBus;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub dispatcher: Dispatcher,
    pub events: Arc<EventBus>,
}

/// Build the complete API router
pub fn create_router(db: DatabaseConnection, dispatcher: Dispatcher, events: Arc<EventBus>) -> Router {
    let state = AppState {
        db,
        dispatcher,
        events,
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/tasks", post(handlers::create_task))
        .route("/api/v1/tasks/:id", get(handlers::get_task))
        .route("/api/v1/tasks/:id/approve", post(handlers::approve_task))
        .route("/ws/tasks/:id", get(ws::ws_tasks_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
