//! Writing collaborator: renders drafts from research findings
//!
//! One template per task kind; the engine supplies the research findings
//! already rendered as markdown sections in topic order.

use async_trait::async_trait;
use llm::ChatClient;
use stagegraph::{DraftWriter, GraphError, TaskKind};
use std::sync::Arc;

/// Higher temperature for more natural prose
const WRITER_TEMPERATURE: f32 = 0.7;

const COMPARISON_TEMPLATE: &str = r#"You are a technical writer creating a comparison.

Based on the following research findings, write a clear comparison for a technical audience.

{research_context}

## Original Request:
{prompt}

Write a professional comparison that:
1. Highlights key differences between the subjects
2. Discusses strengths and weaknesses of each
3. Provides guidance on when to use each
4. Is concise but comprehensive (2-3 paragraphs)

Comparison:"#;

const TUTORIAL_TEMPLATE: &str = r#"You are a technical writer creating a tutorial.

Based on the following research findings, write a step-by-step tutorial.

{research_context}

## Original Request:
{prompt}

Write a clear tutorial that:
1. Lists prerequisites if needed
2. Provides numbered, actionable steps
3. Explains what each step accomplishes
4. Includes practical examples
5. Is beginner-friendly but technically accurate

Tutorial:"#;

const ANALYSIS_TEMPLATE: &str = r#"You are a technical analyst creating an in-depth analysis.

Based on the following research findings, provide a comprehensive technical analysis.

{research_context}

## Original Request:
{prompt}

Write a detailed analysis that:
1. Examines key aspects in depth
2. Discusses trade-offs and considerations
3. Provides technical insights and recommendations
4. Is thorough and well-structured

Analysis:"#;

const SUMMARY_TEMPLATE: &str = r#"You are a technical writer creating an informative summary.

Based on the following research findings, write a clear summary.

{research_context}

## Original Request:
{prompt}

Write a concise summary that:
1. Covers the main points from the research
2. Is well-organized and easy to understand
3. Provides actionable information
4. Is appropriate for a technical audience

Summary:"#;

/// Select the writing template for a task kind
pub fn select_template(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Comparison => COMPARISON_TEMPLATE,
        TaskKind::Tutorial => TUTORIAL_TEMPLATE,
        TaskKind::Analysis => ANALYSIS_TEMPLATE,
        TaskKind::Summary => SUMMARY_TEMPLATE,
    }
}

/// Uses an LLM to render the draft from a task-kind template
pub struct LlmWriter {
    client: Arc<dyn ChatClient>,
}

impl LlmWriter {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DraftWriter for LlmWriter {
    async fn draft(
        &self,
        kind: TaskKind,
        research_context: &str,
        prompt: &str,
    ) -> stagegraph::Result<String> {
        let request = select_template(kind)
            .replace("{research_context}", research_context)
            .replace("{prompt}", prompt);

        self.client
            .complete(&request, WRITER_TEMPERATURE)
            .await
            .map_err(|e| GraphError::Writing(e.to_string()))
    }
}
