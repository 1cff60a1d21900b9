//! Collaborator traits at the engine boundary
//!
//! The engine is an orchestration layer, not an LLM client: it depends on
//! these traits and callers supply implementations (LLM-backed in production,
//! mocks in tests). All collaborators must be `Send + Sync` so they can be
//! shared across worker executors via `Arc`.

use crate::analysis::Analysis;
use crate::error::Result;
use crate::stage::Stage;
use crate::state::TaskKind;
use async_trait::async_trait;

/// Extracts research topics, task kind, and context from a user prompt
#[async_trait]
pub trait PromptAnalyzer: Send + Sync {
    /// Analyze a prompt into structured research requirements
    ///
    /// An error here is not fatal to the workflow: the research stage falls
    /// back to deterministic keyword analysis.
    async fn analyze(&self, prompt: &str) -> Result<Analysis>;
}

/// Gathers findings for a single research query
#[async_trait]
pub trait Researcher: Send + Sync {
    /// Research a query and return findings text
    ///
    /// Calls may be transient-flaky; the engine wraps them in bounded retry.
    async fn research(&self, query: &str) -> Result<String>;
}

/// Renders a draft from research findings
#[async_trait]
pub trait DraftWriter: Send + Sync {
    /// Produce a draft for the given task kind
    ///
    /// `research_context` is the findings rendered as markdown sections;
    /// `prompt` is the original user request.
    async fn draft(&self, kind: TaskKind, research_context: &str, prompt: &str)
        -> Result<String>;
}

/// Receives stage-boundary and agent-action notifications during execution
///
/// Implementations must tolerate being called from any worker executor. The
/// default implementations do nothing.
#[async_trait]
pub trait StageObserver: Send + Sync {
    /// Called immediately before a stage executes
    async fn on_stage(&self, _task_id: &str, _stage: Stage) {}

    /// Called when a collaborator performs a loggable action
    async fn on_agent_action(&self, _task_id: &str, _agent: &str, _action: &str) {}
}

/// Observer that ignores all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl StageObserver for NoopObserver {}
