//! Groq client implementation.
//!
//! Groq exposes an OpenAI-compatible chat-completions endpoint at
//! `https://api.groq.com/openai/v1`, serving Llama-family models with low
//! latency.

use crate::config::LlmConfig;
use crate::error::Result;
use crate::remote::{build_http_client, chat_completion};
use crate::ChatClient;
use async_trait::async_trait;
use reqwest::Client;

/// Groq API client.
#[derive(Clone)]
pub struct GroqClient {
    config: LlmConfig,
    http: Client,
}

impl GroqClient {
    /// Create a new Groq client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { config, http })
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        tracing::debug!(model = %self.config.model, "Sending Groq chat completion");
        chat_completion(&self.http, &self.config, prompt, temperature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;

    #[test]
    fn test_client_construction() {
        let config = LlmConfig::new(LlmProvider::Groq, "test-key");
        let client = GroqClient::new(config).unwrap();
        assert_eq!(client.model(), "llama-3.3-70b-versatile");
    }
}
