//! Prompt analysis result and the deterministic keyword fallback
//!
//! The primary analyzer is an external collaborator (see
//! [`crate::collaborators::PromptAnalyzer`]). When it fails hard, the
//! research stage falls back to [`keyword_analysis`], which always yields a
//! non-empty topic list so the pipeline can still produce output.

use crate::state::TaskKind;
use serde::{Deserialize, Serialize};

/// Structured analysis of a user prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Subjects to research, in priority order
    pub topics: Vec<String>,
    /// Output template selector
    pub task_kind: TaskKind,
    /// Additional requirements (audience, tone, constraints)
    #[serde(default)]
    pub context: String,
}

/// Known subjects recognized by the keyword fallback
const KNOWN_TOPICS: &[(&[&str], &str)] = &[
    (&["langgraph"], "LangGraph"),
    (&["crewai"], "CrewAI"),
    (&["redis"], "Redis"),
    (&["postgresql", "postgres"], "PostgreSQL"),
    (&["docker"], "Docker"),
    (&["kubernetes", "k8s"], "Kubernetes"),
];

/// Deterministic keyword-based prompt analysis
///
/// Always returns at least one topic. Used when the LLM-backed analyzer
/// errors out, so its results are intentionally conservative: the task kind
/// is inferred from a small set of markers and defaults to `Summary`.
pub fn keyword_analysis(prompt: &str) -> Analysis {
    let lower = prompt.to_lowercase();

    let mut topics: Vec<String> = Vec::new();
    for (markers, topic) in KNOWN_TOPICS {
        if markers.iter().any(|m| lower.contains(m)) {
            topics.push((*topic).to_string());
        }
    }
    if topics.is_empty() {
        topics.push("general topic".to_string());
    }

    let task_kind = if ["compare", "vs", "versus", "difference"]
        .iter()
        .any(|w| lower.contains(w))
    {
        TaskKind::Comparison
    } else if ["tutorial", "how to", "guide", "step"]
        .iter()
        .any(|w| lower.contains(w))
    {
        TaskKind::Tutorial
    } else if ["analyze", "analysis", "evaluate", "examine"]
        .iter()
        .any(|w| lower.contains(w))
    {
        TaskKind::Analysis
    } else {
        TaskKind::Summary
    };

    Analysis {
        topics,
        task_kind,
        context: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_prompt() {
        let analysis =
            keyword_analysis("Compare Redis and PostgreSQL for caching use cases.");

        assert_eq!(analysis.task_kind, TaskKind::Comparison);
        assert!(analysis.topics.contains(&"Redis".to_string()));
        assert!(analysis.topics.contains(&"PostgreSQL".to_string()));
    }

    #[test]
    fn test_tutorial_prompt() {
        let analysis =
            keyword_analysis("Create a beginner's tutorial for setting up Docker.");

        assert_eq!(analysis.task_kind, TaskKind::Tutorial);
        assert_eq!(analysis.topics, vec!["Docker".to_string()]);
    }

    #[test]
    fn test_analysis_prompt() {
        let analysis = keyword_analysis(
            "Analyze the trade-offs between microservices and monolithic architectures.",
        );

        assert_eq!(analysis.task_kind, TaskKind::Analysis);
    }

    #[test]
    fn test_topics_never_empty() {
        let analysis = keyword_analysis("Tell me something interesting.");

        assert!(!analysis.topics.is_empty());
        assert_eq!(analysis.task_kind, TaskKind::Summary);
    }

    #[test]
    fn test_k8s_alias() {
        let analysis = keyword_analysis("What is k8s?");
        assert!(analysis.topics.contains(&"Kubernetes".to_string()));
    }
}
