//! Database module for the orchestrator
//!
//! Provides database connectivity, models, repositories, store adapters,
//! and error handling for persistent storage of tasks, checkpoints, and
//! scratchpad workspaces.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod stores;

pub use connection::{DatabaseConnection, DatabasePool};
pub use error::{DatabaseError, DbResult};
pub use stores::{SqliteCheckpointer, SqliteScratchpad};
