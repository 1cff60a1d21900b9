//! Prompt analyzer: extracts research requirements from user prompts

use async_trait::async_trait;
use llm::ChatClient;
use serde::Deserialize;
use stagegraph::{Analysis, GraphError, PromptAnalyzer, TaskKind};
use std::sync::Arc;

/// Low temperature for consistent structured parsing
const ANALYZER_TEMPERATURE: f32 = 0.1;

const ANALYSIS_PROMPT: &str = r#"You are a prompt analysis assistant. Analyze the following user request and extract structured information.

User Request:
"{prompt}"

Analyze this request and provide a JSON response with the following structure:
{
    "topics": ["topic1", "topic2", ...],
    "task_type": "comparison" | "tutorial" | "analysis" | "summary",
    "context": "any additional context or requirements"
}

Guidelines:
- topics: Extract all subjects, frameworks, technologies, or concepts that need to be researched
- task_type:
  - "comparison": When comparing multiple things (e.g., "compare X and Y", "X vs Y")
  - "tutorial": When asking for how-to guides, step-by-step instructions
  - "analysis": When asking for in-depth examination or evaluation
  - "summary": When asking for general information or overview
- context: Capture any specific requirements like "for technical audience", "beginner-friendly", etc.

Respond ONLY with valid JSON, no other text.

JSON:"#;

/// Uses an LLM to parse prompts into topics, task kind, and context
///
/// Analysis failures are recoverable: the engine substitutes its keyword
/// fallback, so errors here never fail the workflow.
pub struct LlmAnalyzer {
    client: Arc<dyn ChatClient>,
}

impl LlmAnalyzer {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

/// Raw shape of the model's JSON answer, before validation
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    topics: serde_json::Value,
    task_type: Option<String>,
    #[serde(default)]
    context: String,
}

#[async_trait]
impl PromptAnalyzer for LlmAnalyzer {
    async fn analyze(&self, prompt: &str) -> stagegraph::Result<Analysis> {
        let request = ANALYSIS_PROMPT.replace("{prompt}", prompt);
        let response = self
            .client
            .complete(&request, ANALYZER_TEMPERATURE)
            .await
            .map_err(|e| GraphError::Analysis(e.to_string()))?;

        parse_analysis(&response)
    }
}

/// Parse and validate the model's JSON answer
fn parse_analysis(response: &str) -> stagegraph::Result<Analysis> {
    let content = strip_code_fences(response.trim());

    let raw: RawAnalysis = serde_json::from_str(content)
        .map_err(|e| GraphError::Analysis(format!("invalid analysis JSON: {}", e)))?;

    // A bare string topic is coerced to a one-element list
    let topics: Vec<String> = match raw.topics {
        serde_json::Value::String(topic) => vec![topic],
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        other => {
            return Err(GraphError::Analysis(format!(
                "topics must be a list, got: {}",
                other
            )))
        }
    };
    if topics.is_empty() {
        return Err(GraphError::Analysis("analysis produced no topics".to_string()));
    }

    // Invalid kinds default to summary
    let task_kind = raw
        .task_type
        .as_deref()
        .and_then(|s| s.parse::<TaskKind>().ok())
        .unwrap_or(TaskKind::Summary);

    Ok(Analysis {
        topics,
        task_kind,
        context: raw.context,
    })
}

/// Remove a surrounding markdown code fence, if present
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    without_open
        .trim_end()
        .trim_end_matches("```")
        .trim()
}
