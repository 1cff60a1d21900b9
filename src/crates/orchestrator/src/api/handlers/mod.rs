//! API request handlers

pub mod health;
pub mod tasks;

pub use health::health;
pub use tasks::{approve_task, create_task, get_task};
