//! Remote chat-completion providers.
//!
//! Both supported providers speak the OpenAI chat-completions wire format;
//! the shared request/response types and transport live here, and each
//! provider module contributes its client type.

pub mod groq;
pub mod openai;

pub use groq::GroqClient;
pub use openai::OpenAiClient;

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Single message in a chat-completions conversation.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

/// Issue a chat-completions call and extract the assistant's text.
pub(crate) async fn chat_completion(
    http: &Client,
    config: &LlmConfig,
    prompt: &str,
    temperature: f32,
) -> Result<String> {
    let request = ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature,
    };

    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let response = http
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationError(format!("{}: {}", status, body))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                LlmError::RateLimitExceeded(format!("{}: {}", status, body))
            }
            s if s.is_server_error() => {
                LlmError::ServiceUnavailable(format!("{}: {}", status, body))
            }
            _ => LlmError::ProviderError(format!("{}: {}", status, body)),
        });
    }

    let parsed: ChatCompletionResponse = response.json().await?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

    Ok(choice.message.content)
}

/// Build the HTTP client for a provider configuration.
pub(crate) fn build_http_client(config: &LlmConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(LlmError::HttpError)
}
