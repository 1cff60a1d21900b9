//! Workflow engine: stage graph execution with checkpointed suspension
//!
//! The engine drives a [`WorkflowState`] through the fixed stage graph,
//! committing a checkpoint before entering each stage. The approval stage is
//! the single suspension point: instead of blocking, it persists a
//! suspension descriptor alongside the checkpoint and returns
//! [`RunOutcome::Suspended`]. Resumption is a separate top-level entry that
//! restores the checkpointed state, injects the approval payload, and
//! continues. No stack-preserving coroutines are involved; suspension is
//! return-with-descriptor.

use crate::analysis::keyword_analysis;
use crate::collaborators::{
    DraftWriter, NoopObserver, PromptAnalyzer, Researcher, StageObserver,
};
use crate::error::{GraphError, Result};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::stage::Stage;
use crate::state::{Approval, StatePatch, TaskKind, WorkflowState};
use crate::store::Scratchpad;
use checkpoint::{Checkpoint, Checkpointer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Question surfaced to the human reviewer at the approval stage
pub const APPROVAL_QUESTION: &str = "Do you approve this draft?";

/// Draft produced when the writing stage has nothing to work with
pub const EMPTY_RESEARCH_DRAFT: &str =
    "Error: No research results available to generate content.";

/// Structured value surfaced when the workflow suspends for approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionDescriptor {
    /// Question posed to the reviewer
    pub question: String,
    /// Task awaiting review
    pub task_id: String,
    /// Draft under review
    pub draft: String,
}

/// Payload delivered to the suspended approval stage on resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    /// Whether the draft was approved
    pub approved: bool,
    /// Optional reviewer feedback
    #[serde(default)]
    pub feedback: String,
}

/// Result of a `run` or `resume` invocation
///
/// `Failed` is a graceful terminal outcome (e.g. a rejected draft), not an
/// execution error; execution errors surface as `Err(GraphError)` and are
/// the dispatcher's retry trigger.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Workflow paused at the approval stage
    Suspended(SuspensionDescriptor),
    /// Workflow finished; the state carries the final result
    Completed(Box<WorkflowState>),
    /// Workflow terminated without a result; the string is the diagnostic
    Failed(String),
}

/// Stage graph executor
///
/// Cheap to clone behind `Arc`; one engine instance is shared by all worker
/// executors. Each invocation is logically sequential: stages run to
/// completion before the next begins.
pub struct WorkflowEngine {
    analyzer: Arc<dyn PromptAnalyzer>,
    researcher: Arc<dyn Researcher>,
    writer: Arc<dyn DraftWriter>,
    checkpointer: Arc<dyn Checkpointer>,
    scratchpad: Arc<dyn Scratchpad>,
    observer: Arc<dyn StageObserver>,
    retry: RetryPolicy,
}

impl WorkflowEngine {
    /// Create an engine over the given collaborators and stores
    pub fn new(
        analyzer: Arc<dyn PromptAnalyzer>,
        researcher: Arc<dyn Researcher>,
        writer: Arc<dyn DraftWriter>,
        checkpointer: Arc<dyn Checkpointer>,
        scratchpad: Arc<dyn Scratchpad>,
    ) -> Self {
        Self {
            analyzer,
            researcher,
            writer,
            checkpointer,
            scratchpad,
            observer: Arc::new(NoopObserver),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy for research collaborator calls
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the stage observer notified at stage boundaries
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Begin (or safely re-execute) a workflow for a task
    ///
    /// If a checkpoint already exists for the task the execution continues
    /// from the checkpointed stage instead of starting over, which makes
    /// re-enqueued commands after a process kill safe. A checkpoint parked
    /// at the approval stage short-circuits to the stored suspension
    /// descriptor without re-running anything.
    pub async fn run(&self, task_id: &str, prompt: &str) -> Result<RunOutcome> {
        if let Some(cp) = self.checkpointer.load(task_id).await? {
            let stage: Stage = cp.resume_stage.parse()?;
            if stage == Stage::Approval {
                let descriptor = match cp.suspension {
                    Some(value) => serde_json::from_value(value)?,
                    None => {
                        let state: WorkflowState = serde_json::from_value(cp.state)?;
                        SuspensionDescriptor {
                            question: APPROVAL_QUESTION.to_string(),
                            task_id: task_id.to_string(),
                            draft: state.draft,
                        }
                    }
                };
                return Ok(RunOutcome::Suspended(descriptor));
            }

            let state: WorkflowState = serde_json::from_value(cp.state)?;
            return self.advance(state, stage).await;
        }

        let state = WorkflowState::new(task_id, prompt);
        self.advance(state, Stage::Research).await
    }

    /// Resume a suspended workflow with an approval payload
    ///
    /// Loads the latest checkpoint, verifies it is parked at the approval
    /// stage, merges the payload into the state, and routes to `finalize`
    /// or `rejected`.
    pub async fn resume(&self, task_id: &str, payload: ApprovalPayload) -> Result<RunOutcome> {
        let cp = self
            .checkpointer
            .load(task_id)
            .await?
            .ok_or_else(|| GraphError::CheckpointNotFound(task_id.to_string()))?;

        let stage: Stage = cp.resume_stage.parse()?;
        if stage != Stage::Approval {
            return Err(GraphError::NotSuspended {
                task_id: task_id.to_string(),
                stage: stage.to_string(),
            });
        }

        let mut state: WorkflowState = serde_json::from_value(cp.state)?;
        let next = if payload.approved {
            Stage::Finalize
        } else {
            Stage::Rejected
        };
        state.apply(StatePatch {
            approval: Some(Approval {
                approved: payload.approved,
                feedback: payload.feedback,
            }),
            ..Default::default()
        });

        self.advance(state, next).await
    }

    /// Execute stages from `stage` until suspension or a terminal stage
    async fn advance(&self, mut state: WorkflowState, mut stage: Stage) -> Result<RunOutcome> {
        loop {
            self.observer.on_stage(&state.task_id, stage).await;
            self.save_checkpoint(&state, stage, None).await?;

            match stage {
                Stage::Research => {
                    let patch = self.research_stage(&state).await?;
                    state.apply(patch);
                    stage = Stage::Writing;
                }
                Stage::Writing => {
                    let patch = self.writing_stage(&state).await?;
                    state.apply(patch);
                    stage = Stage::Approval;
                }
                Stage::Approval => {
                    let descriptor = SuspensionDescriptor {
                        question: APPROVAL_QUESTION.to_string(),
                        task_id: state.task_id.clone(),
                        draft: state.draft.clone(),
                    };
                    self.save_checkpoint(&state, stage, Some(&descriptor)).await?;
                    return Ok(RunOutcome::Suspended(descriptor));
                }
                Stage::Finalize => {
                    state.result = state.draft.clone();
                    self.release(&state.task_id).await?;
                    return Ok(RunOutcome::Completed(Box::new(state)));
                }
                Stage::Rejected => {
                    let feedback = state
                        .approval
                        .as_ref()
                        .map(|a| a.feedback.clone())
                        .filter(|f| !f.is_empty())
                        .unwrap_or_else(|| "Draft was rejected".to_string());
                    state.error = feedback.clone();
                    self.release(&state.task_id).await?;
                    return Ok(RunOutcome::Failed(feedback));
                }
            }
        }
    }

    /// Commit a checkpoint for the stage about to execute
    async fn save_checkpoint(
        &self,
        state: &WorkflowState,
        stage: Stage,
        suspension: Option<&SuspensionDescriptor>,
    ) -> Result<()> {
        let mut cp = Checkpoint::new(
            state.task_id.clone(),
            stage.as_str(),
            serde_json::to_value(state)?,
        );
        if let Some(descriptor) = suspension {
            cp = cp.with_suspension(serde_json::to_value(descriptor)?);
        }
        self.checkpointer.save(cp).await?;
        Ok(())
    }

    /// Release the scratchpad and checkpoint on terminal stages
    async fn release(&self, task_id: &str) -> Result<()> {
        self.scratchpad.delete(task_id).await?;
        self.checkpointer.delete(task_id).await?;
        Ok(())
    }

    /// Research stage: analyze the prompt, then gather findings per topic
    ///
    /// Analyzer failures fall back to deterministic keyword analysis. A topic
    /// whose research keeps failing is retained with a textual error marker
    /// so the pipeline still produces output. Re-execution overwrites the
    /// same scratchpad keys, so the stage is idempotent.
    async fn research_stage(&self, state: &WorkflowState) -> Result<StatePatch> {
        let task_id = &state.task_id;
        self.observer
            .on_agent_action(task_id, "ResearchAgent", "Analyzing prompt to extract research topics")
            .await;

        let analysis = match self.analyzer.analyze(&state.prompt).await {
            Ok(analysis) if !analysis.topics.is_empty() => analysis,
            Ok(_) => {
                warn!(%task_id, "Analyzer returned no topics, using keyword fallback");
                keyword_analysis(&state.prompt)
            }
            Err(e) => {
                warn!(%task_id, error = %e, "Prompt analysis failed, using keyword fallback");
                keyword_analysis(&state.prompt)
            }
        };

        self.observer
            .on_agent_action(
                task_id,
                "ResearchAgent",
                &format!(
                    "Identified {} topics: {} | Task kind: {}",
                    analysis.topics.len(),
                    analysis.topics.join(", "),
                    analysis.task_kind
                ),
            )
            .await;

        let mut results: Vec<(String, String)> = Vec::with_capacity(analysis.topics.len());
        for topic in &analysis.topics {
            self.observer
                .on_agent_action(task_id, "ResearchAgent", &format!("Researching: {}", topic))
                .await;

            let mut query = format!("{} - {}", topic, state.prompt);
            if !analysis.context.is_empty() {
                query.push_str(&format!(" | Context: {}", analysis.context));
            }

            let researcher = Arc::clone(&self.researcher);
            let outcome = retry_with_backoff(&self.retry, "research", || {
                let researcher = Arc::clone(&researcher);
                let query = query.clone();
                async move { researcher.research(&query).await }
            })
            .await;

            match outcome {
                Ok(findings) => {
                    self.observer
                        .on_agent_action(
                            task_id,
                            "ResearchAgent",
                            &format!("Completed research for: {}", topic),
                        )
                        .await;
                    results.push((topic.clone(), findings));
                }
                Err(e) => {
                    self.observer
                        .on_agent_action(
                            task_id,
                            "ResearchAgent",
                            &format!("Failed to research {}: {}", topic, e),
                        )
                        .await;
                    results.push((topic.clone(), format!("Research failed: {}", e)));
                }
            }
        }

        self.observer
            .on_agent_action(
                task_id,
                "ResearchAgent",
                &format!("Research completed for all {} topics", analysis.topics.len()),
            )
            .await;

        let findings: HashMap<&str, &str> = results
            .iter()
            .map(|(topic, text)| (topic.as_str(), text.as_str()))
            .collect();
        self.scratchpad
            .save(
                task_id,
                json!({
                    "research_results": findings,
                    "topics": analysis.topics,
                    "task_type": analysis.task_kind.as_str(),
                    "context": analysis.context,
                }),
            )
            .await?;

        Ok(StatePatch {
            topics: Some(analysis.topics),
            task_kind: Some(analysis.task_kind),
            context: Some(analysis.context),
            research_results: Some(results),
            ..Default::default()
        })
    }

    /// Writing stage: render a draft from the research findings
    ///
    /// Prefers research in the in-memory state; falls back to the scratchpad,
    /// which covers a checkpoint restored on a fresh process. With no
    /// research at all, emits a well-formed error draft and continues so the
    /// reviewer can reject it.
    async fn writing_stage(&self, state: &WorkflowState) -> Result<StatePatch> {
        let task_id = &state.task_id;
        let mut render = state.clone();

        if render.research_results.is_empty() {
            self.observer
                .on_agent_action(task_id, "WritingAgent", "Loading research from scratchpad")
                .await;
            if let Some(workspace) = self.scratchpad.get(task_id).await? {
                render.apply(patch_from_workspace(&workspace));
            }
        }

        self.observer
            .on_agent_action(
                task_id,
                "WritingAgent",
                &format!("Starting {} generation", render.task_kind),
            )
            .await;

        if render.research_results.is_empty() {
            self.observer
                .on_agent_action(task_id, "WritingAgent", "No research results available")
                .await;
            return Ok(StatePatch {
                draft: Some(EMPTY_RESEARCH_DRAFT.to_string()),
                ..Default::default()
            });
        }

        let context = render.research_context();
        let draft = self
            .writer
            .draft(render.task_kind, &context, &render.prompt)
            .await?;

        self.observer
            .on_agent_action(
                task_id,
                "WritingAgent",
                &format!("Generated {} character draft for approval", draft.len()),
            )
            .await;

        Ok(StatePatch {
            draft: Some(draft),
            topics: Some(render.topics),
            task_kind: Some(render.task_kind),
            research_results: Some(render.research_results.into_iter().collect()),
            ..Default::default()
        })
    }
}

/// Reconstruct a state patch from a scratchpad workspace object
fn patch_from_workspace(workspace: &serde_json::Value) -> StatePatch {
    let topics = workspace["topics"].as_array().map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });
    let task_kind = workspace["task_type"]
        .as_str()
        .and_then(|s| s.parse::<TaskKind>().ok());
    let research_results = workspace["research_results"].as_object().map(|map| {
        map.iter()
            .filter_map(|(topic, findings)| {
                findings
                    .as_str()
                    .map(|text| (topic.clone(), text.to_string()))
            })
            .collect()
    });

    StatePatch {
        topics,
        task_kind,
        research_results,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;
    use crate::store::MemoryScratchpad;
    use async_trait::async_trait;
    use checkpoint::MemoryCheckpointer;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FixedAnalyzer(Analysis);

    #[async_trait]
    impl PromptAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _prompt: &str) -> Result<Analysis> {
            Ok(self.0.clone())
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl PromptAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _prompt: &str) -> Result<Analysis> {
            Err(GraphError::Analysis("model returned garbage".to_string()))
        }
    }

    struct EchoResearcher;

    #[async_trait]
    impl Researcher for EchoResearcher {
        async fn research(&self, query: &str) -> Result<String> {
            Ok(format!("Findings about {}", query))
        }
    }

    /// Fails the first call for every distinct query, succeeds afterwards
    struct FlakyResearcher {
        calls: Mutex<HashMap<String, u32>>,
    }

    impl FlakyResearcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl Researcher for FlakyResearcher {
        async fn research(&self, query: &str) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(query.to_string()).or_insert(0);
            *count += 1;
            if *count == 1 {
                Err(GraphError::Research("simulated transient failure".to_string()))
            } else {
                Ok(format!("Flaky research succeeded on attempt {}", count))
            }
        }
    }

    struct AlwaysFailingResearcher;

    #[async_trait]
    impl Researcher for AlwaysFailingResearcher {
        async fn research(&self, _query: &str) -> Result<String> {
            Err(GraphError::Research("connection refused".to_string()))
        }
    }

    struct TemplateWriter;

    #[async_trait]
    impl DraftWriter for TemplateWriter {
        async fn draft(
            &self,
            kind: TaskKind,
            research_context: &str,
            prompt: &str,
        ) -> Result<String> {
            Ok(format!(
                "[{}] Based on: {}\n\n{}",
                kind, prompt, research_context
            ))
        }
    }

    struct CountingObserver {
        stages: AtomicU32,
        actions: AtomicU32,
    }

    #[async_trait]
    impl StageObserver for CountingObserver {
        async fn on_stage(&self, _task_id: &str, _stage: Stage) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_agent_action(&self, _task_id: &str, _agent: &str, _action: &str) {
            self.actions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3).with_min_delay(1).with_max_delay(5)
    }

    fn comparison_analysis() -> Analysis {
        Analysis {
            topics: vec!["Redis".to_string(), "PostgreSQL".to_string()],
            task_kind: TaskKind::Comparison,
            context: "for caching use cases".to_string(),
        }
    }

    struct Harness {
        engine: WorkflowEngine,
        checkpointer: Arc<MemoryCheckpointer>,
        scratchpad: Arc<MemoryScratchpad>,
    }

    fn harness_with(
        analyzer: Arc<dyn PromptAnalyzer>,
        researcher: Arc<dyn Researcher>,
    ) -> Harness {
        let checkpointer = Arc::new(MemoryCheckpointer::new());
        let scratchpad = Arc::new(MemoryScratchpad::new());
        let engine = WorkflowEngine::new(
            analyzer,
            researcher,
            Arc::new(TemplateWriter),
            checkpointer.clone(),
            scratchpad.clone(),
        )
        .with_retry_policy(fast_retry());
        Harness {
            engine,
            checkpointer,
            scratchpad,
        }
    }

    fn default_harness() -> Harness {
        harness_with(
            Arc::new(FixedAnalyzer(comparison_analysis())),
            Arc::new(EchoResearcher),
        )
    }

    #[tokio::test]
    async fn test_run_suspends_at_approval() {
        let h = default_harness();
        let outcome = h
            .engine
            .run("t1", "Compare Redis and PostgreSQL for caching use cases.")
            .await
            .unwrap();

        let descriptor = match outcome {
            RunOutcome::Suspended(d) => d,
            other => panic!("expected suspension, got {:?}", other),
        };
        assert_eq!(descriptor.question, APPROVAL_QUESTION);
        assert_eq!(descriptor.task_id, "t1");
        assert!(descriptor.draft.contains("Redis"));
        assert!(descriptor.draft.contains("PostgreSQL"));

        // Exactly one live checkpoint, parked at approval
        let cp = h.checkpointer.load("t1").await.unwrap().unwrap();
        assert_eq!(cp.resume_stage, "approval");
        assert!(cp.is_suspended());
        assert_eq!(h.checkpointer.len(), 1);
    }

    #[tokio::test]
    async fn test_resume_approved_completes() {
        let h = default_harness();
        h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let outcome = h
            .engine
            .resume(
                "t1",
                ApprovalPayload {
                    approved: true,
                    feedback: String::new(),
                },
            )
            .await
            .unwrap();

        let state = match outcome {
            RunOutcome::Completed(state) => state,
            other => panic!("expected completion, got {:?}", other),
        };
        assert!(!state.result.is_empty());
        assert_eq!(state.result, state.draft);
        assert!(state.result.to_lowercase().contains("redis"));

        // Terminal stages release checkpoint and scratchpad
        assert!(h.checkpointer.load("t1").await.unwrap().is_none());
        assert!(h.scratchpad.get("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_rejected_fails_with_feedback() {
        let h = default_harness();
        h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let outcome = h
            .engine
            .resume(
                "t1",
                ApprovalPayload {
                    approved: false,
                    feedback: "nope".to_string(),
                },
            )
            .await
            .unwrap();

        match outcome {
            RunOutcome::Failed(error) => assert_eq!(error, "nope"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(h.checkpointer.load("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejection_without_feedback_gets_default() {
        let h = default_harness();
        h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let outcome = h
            .engine
            .resume(
                "t1",
                ApprovalPayload {
                    approved: false,
                    feedback: String::new(),
                },
            )
            .await
            .unwrap();

        match outcome {
            RunOutcome::Failed(error) => assert_eq!(error, "Draft was rejected"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resume_without_checkpoint() {
        let h = default_harness();
        let result = h
            .engine
            .resume(
                "missing",
                ApprovalPayload {
                    approved: true,
                    feedback: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(GraphError::CheckpointNotFound(_))));
    }

    #[tokio::test]
    async fn test_resume_rejects_non_suspended_checkpoint() {
        let h = default_harness();
        let state = WorkflowState::new("t1", "prompt");
        h.checkpointer
            .save(Checkpoint::new(
                "t1",
                "research",
                serde_json::to_value(&state).unwrap(),
            ))
            .await
            .unwrap();

        let result = h
            .engine
            .resume(
                "t1",
                ApprovalPayload {
                    approved: true,
                    feedback: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(GraphError::NotSuspended { .. })));
    }

    #[tokio::test]
    async fn test_analyzer_failure_falls_back_to_keywords() {
        let h = harness_with(Arc::new(FailingAnalyzer), Arc::new(EchoResearcher));
        let outcome = h
            .engine
            .run("t1", "Compare Redis and PostgreSQL for caching use cases.")
            .await
            .unwrap();

        let descriptor = match outcome {
            RunOutcome::Suspended(d) => d,
            other => panic!("expected suspension, got {:?}", other),
        };
        // Keyword fallback still identifies both subjects
        assert!(descriptor.draft.contains("Redis"));
        assert!(descriptor.draft.contains("PostgreSQL"));
    }

    #[tokio::test]
    async fn test_flaky_researcher_recovers_via_retry() {
        let h = harness_with(
            Arc::new(FixedAnalyzer(comparison_analysis())),
            Arc::new(FlakyResearcher::new()),
        );
        let outcome = h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let descriptor = match outcome {
            RunOutcome::Suspended(d) => d,
            other => panic!("expected suspension, got {:?}", other),
        };
        // The transient failure never surfaces in the draft
        assert!(descriptor.draft.contains("succeeded on attempt 2"));
        assert!(!descriptor.draft.contains("Research failed"));
    }

    #[tokio::test]
    async fn test_exhausted_research_retained_with_marker() {
        let h = harness_with(
            Arc::new(FixedAnalyzer(comparison_analysis())),
            Arc::new(AlwaysFailingResearcher),
        );
        let outcome = h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let descriptor = match outcome {
            RunOutcome::Suspended(d) => d,
            other => panic!("expected suspension, got {:?}", other),
        };
        // Pipeline still produced a draft, with failure markers per topic
        assert!(descriptor.draft.contains("Research failed: "));
    }

    #[tokio::test]
    async fn test_writing_falls_back_to_scratchpad() {
        let h = default_harness();

        // Simulate a checkpoint restored on a fresh process: the state at the
        // writing boundary carries no research, but the scratchpad does.
        h.scratchpad
            .save(
                "t1",
                json!({
                    "research_results": {"Redis": "in-memory store"},
                    "topics": ["Redis"],
                    "task_type": "summary",
                    "context": "",
                }),
            )
            .await
            .unwrap();
        let state = WorkflowState::new("t1", "Tell me about Redis");
        h.checkpointer
            .save(Checkpoint::new(
                "t1",
                "writing",
                serde_json::to_value(&state).unwrap(),
            ))
            .await
            .unwrap();

        let outcome = h.engine.run("t1", "Tell me about Redis").await.unwrap();
        let descriptor = match outcome {
            RunOutcome::Suspended(d) => d,
            other => panic!("expected suspension, got {:?}", other),
        };
        assert!(descriptor.draft.contains("in-memory store"));
    }

    #[tokio::test]
    async fn test_writing_without_research_produces_error_draft() {
        let h = default_harness();

        let state = WorkflowState::new("t1", "Tell me about Redis");
        h.checkpointer
            .save(Checkpoint::new(
                "t1",
                "writing",
                serde_json::to_value(&state).unwrap(),
            ))
            .await
            .unwrap();

        let outcome = h.engine.run("t1", "Tell me about Redis").await.unwrap();
        match outcome {
            RunOutcome::Suspended(d) => assert_eq!(d.draft, EMPTY_RESEARCH_DRAFT),
            other => panic!("expected suspension, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rerun_while_suspended_is_idempotent() {
        let h = default_harness();
        let first = h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();
        let second = h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let (d1, d2) = match (first, second) {
            (RunOutcome::Suspended(a), RunOutcome::Suspended(b)) => (a, b),
            other => panic!("expected two suspensions, got {:?}", other),
        };
        assert_eq!(d1, d2);
        assert_eq!(h.checkpointer.len(), 1);
    }

    #[tokio::test]
    async fn test_observer_sees_stage_boundaries() {
        let observer = Arc::new(CountingObserver {
            stages: AtomicU32::new(0),
            actions: AtomicU32::new(0),
        });
        let checkpointer = Arc::new(MemoryCheckpointer::new());
        let scratchpad = Arc::new(MemoryScratchpad::new());
        let engine = WorkflowEngine::new(
            Arc::new(FixedAnalyzer(comparison_analysis())),
            Arc::new(EchoResearcher),
            Arc::new(TemplateWriter),
            checkpointer,
            scratchpad,
        )
        .with_retry_policy(fast_retry())
        .with_observer(observer.clone());

        engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        // research, writing, approval
        assert_eq!(observer.stages.load(Ordering::SeqCst), 3);
        assert!(observer.actions.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn test_scratchpad_populated_after_research() {
        let h = default_harness();
        h.engine.run("t1", "Compare Redis and PostgreSQL").await.unwrap();

        let workspace = h.scratchpad.get("t1").await.unwrap().unwrap();
        assert!(workspace["research_results"]["Redis"]
            .as_str()
            .unwrap()
            .contains("Redis"));
        assert_eq!(workspace["task_type"], "comparison");
    }
}
