//! OpenAI client implementation.
//!
//! Connects to OpenAI's chat-completions API (GPT-4o family and others).

use crate::config::LlmConfig;
use crate::error::Result;
use crate::remote::{build_http_client, chat_completion};
use crate::ChatClient;
use async_trait::async_trait;
use reqwest::Client;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: LlmConfig,
    http: Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given configuration.
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
impl ChatClient for OpenAiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        tracing::debug!(model = %self.config.model, "Sending OpenAI chat completion");
        chat_completion(&self.http, &self.config, prompt, temperature).await
    }
}
