//! Research collaborator: gathers findings for a topic query

use async_trait::async_trait;
use llm::ChatClient;
use stagegraph::{GraphError, Researcher};
use std::sync::Arc;

/// Higher temperature for richer findings
const RESEARCH_TEMPERATURE: f32 = 0.7;

const RESEARCH_PROMPT: &str = r#"You are a technical research assistant. Provide comprehensive, accurate information about the following topic:

{query}

Your response should include:
1. **Overview**: Brief introduction and context
2. **Key Features**: Main characteristics and capabilities
3. **Use Cases**: Common applications and scenarios
4. **Technical Details**: Important technical aspects
5. **Strengths**: Main advantages and benefits

Be specific, technical, and comprehensive. Focus on factual information."#;

/// Uses the LLM's knowledge to research a topic
///
/// Transient failures (network, rate limits) surface as errors; the engine
/// wraps calls in bounded retry, so they are recoverable.
pub struct LlmResearcher {
    client: Arc<dyn ChatClient>,
}

impl LlmResearcher {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, query: &str) -> stagegraph::Result<String> {
        let request = RESEARCH_PROMPT.replace("{query}", query);
        self.client
            .complete(&request, RESEARCH_TEMPERATURE)
            .await
            .map_err(|e| GraphError::Research(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::LlmError;

    struct CannedClient(String);

    #[async_trait]
    impl ChatClient for CannedClient {
        async fn complete(&self, _prompt: &str, _temperature: f32) -> llm::Result<String> {
            Ok(self.0.clone())
        }
    }

    struct BrokenClient;

    #[async_trait]
    impl ChatClient for BrokenClient {
        async fn complete(&self, _prompt: &str, _temperature: f32) -> llm::Result<String> {
            Err(LlmError::ServiceUnavailable("503".to_string()))
        }
    }

    #[tokio::test]
    async fn test_research_returns_findings() {
        let researcher = LlmResearcher::new(Arc::new(CannedClient(
            "Redis is an in-memory data structure store.".to_string(),
        )));
        let findings = researcher.research("Redis - caching").await.unwrap();
        assert!(findings.contains("Redis"));
    }

    #[tokio::test]
    async fn test_research_propagates_errors() {
        let researcher = LlmResearcher::new(Arc::new(BrokenClient));
        let result = researcher.research("Redis").await;
        assert!(matches!(result, Err(GraphError::Research(_))));
    }
}
