//! Database models
//!
//! Core data models for persistent storage. All timestamp fields are stored
//! as RFC3339 strings (TEXT in SQLite) due to sqlx and SQLite type
//! limitations with chrono::DateTime<Utc>.

pub mod checkpoint_row;
pub mod task;
pub mod workspace;

pub use checkpoint_row::CheckpointRow;
pub use task::{LogEntry, Task};
pub use workspace::WorkspaceRow;
