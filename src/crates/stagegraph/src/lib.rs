//! Stage graph execution engine for scribe workflows
//!
//! This crate implements the durable interruptible workflow core: a fixed
//! directed graph of stages executed against a mutable [`WorkflowState`],
//! with exactly one suspension point (human approval) realized as
//! return-with-descriptor plus a durable checkpoint.
//!
//! The engine is an orchestration layer, not an LLM client: prompt analysis,
//! research, and drafting are [`collaborators`] traits supplied by the
//! caller. See the `orchestrator` crate for the production wiring.

pub mod analysis;
pub mod collaborators;
pub mod engine;
pub mod error;
pub mod retry;
pub mod stage;
pub mod state;
pub mod store;

pub use analysis::{keyword_analysis, Analysis};
pub use collaborators::{
    DraftWriter, NoopObserver, PromptAnalyzer, Researcher, StageObserver,
};
pub use engine::{
    ApprovalPayload, RunOutcome, SuspensionDescriptor, WorkflowEngine, APPROVAL_QUESTION,
};
pub use error::{GraphError, Result};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use stage::Stage;
pub use state::{Approval, StatePatch, TaskKind, WorkflowState};
pub use store::{workspace_key, MemoryScratchpad, Scratchpad, SCRATCHPAD_TTL};
