//! REST + WebSocket API layer
//!
//! Thin shell around the core: request handlers validate input, touch the
//! task record, and enqueue dispatcher commands; the push channel forwards
//! broadcast events to WebSocket observers.

pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod ws;

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, AppState};
