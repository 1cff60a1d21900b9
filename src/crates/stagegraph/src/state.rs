//! Workflow state and stage patch merging
//!
//! A single [`WorkflowState`] flows through all stages. Stages do not mutate
//! the state directly: they produce a [`StatePatch`] that the engine merges
//! in. Scalar fields overwrite, the research map union-merges, and topic
//! order is preserved so rendering stays deterministic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Classifier derived from the prompt, selecting the output template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Compare multiple subjects
    Comparison,
    /// Step-by-step how-to guide
    Tutorial,
    /// In-depth examination or evaluation
    Analysis,
    /// General overview
    #[default]
    Summary,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Comparison => "comparison",
            TaskKind::Tutorial => "tutorial",
            TaskKind::Analysis => "analysis",
            TaskKind::Summary => "summary",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = ();

    /// Unknown kinds parse as `Summary`, matching the analyzer's defaulting
    /// behavior for invalid classifications.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "comparison" => TaskKind::Comparison,
            "tutorial" => TaskKind::Tutorial,
            "analysis" => TaskKind::Analysis,
            _ => TaskKind::Summary,
        })
    }
}

/// Human approval decision delivered on resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Whether the draft was approved
    pub approved: bool,
    /// Optional reviewer feedback
    #[serde(default)]
    pub feedback: String,
}

/// State shared across all stages of a workflow execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Task being processed
    pub task_id: String,

    /// Original user prompt, immutable after creation
    pub prompt: String,

    /// Topics extracted from the prompt, in analysis order
    #[serde(default)]
    pub topics: Vec<String>,

    /// Output template selector
    #[serde(default)]
    pub task_kind: TaskKind,

    /// Additional requirements captured by the analyzer
    #[serde(default)]
    pub context: String,

    /// Findings per topic; rendering order comes from `topics`
    #[serde(default)]
    pub research_results: HashMap<String, String>,

    /// Draft produced by the writing stage
    #[serde(default)]
    pub draft: String,

    /// Approval decision, set on resume
    #[serde(default)]
    pub approval: Option<Approval>,

    /// Final approved output
    #[serde(default)]
    pub result: String,

    /// Failure diagnostic
    #[serde(default)]
    pub error: String,
}

impl WorkflowState {
    /// Create the initial state for a new execution
    pub fn new(task_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Merge a stage patch into the state
    ///
    /// Scalar fields overwrite when present. `research_results` is
    /// union-merged: new keys are added, existing keys overwritten. Topic
    /// order from the patch replaces the previous order wholesale, which
    /// preserves the analyzer's ordering across merges.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(topics) = patch.topics {
            self.topics = topics;
        }
        if let Some(kind) = patch.task_kind {
            self.task_kind = kind;
        }
        if let Some(context) = patch.context {
            self.context = context;
        }
        if let Some(results) = patch.research_results {
            for (topic, findings) in results {
                self.research_results.insert(topic, findings);
            }
        }
        if let Some(draft) = patch.draft {
            self.draft = draft;
        }
        if let Some(approval) = patch.approval {
            self.approval = Some(approval);
        }
        if let Some(result) = patch.result {
            self.result = result;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
    }

    /// Render the research findings as markdown sections, one per topic,
    /// in topic order. Topics without findings are skipped.
    pub fn research_context(&self) -> String {
        if self.research_results.is_empty() {
            return "No research available.".to_string();
        }

        let mut sections = Vec::with_capacity(self.topics.len());
        for topic in &self.topics {
            if let Some(findings) = self.research_results.get(topic) {
                sections.push(format!("## {}\n{}", topic, findings));
            }
        }
        // Findings for topics that fell out of the ordered list still render,
        // after the ordered ones.
        for (topic, findings) in &self.research_results {
            if !self.topics.contains(topic) {
                sections.push(format!("## {}\n{}", topic, findings));
            }
        }

        sections.join("\n\n")
    }
}

/// Partial state produced by a stage, merged via [`WorkflowState::apply`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePatch {
    pub topics: Option<Vec<String>>,
    pub task_kind: Option<TaskKind>,
    pub context: Option<String>,
    pub research_results: Option<Vec<(String, String)>>,
    pub draft: Option<String>,
    pub approval: Option<Approval>,
    pub result: Option<String>,
    pub error: Option<String>,
}
