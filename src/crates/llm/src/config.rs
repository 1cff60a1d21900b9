//! Provider selection and configuration for LLM clients.
//!
//! Configuration is environment-driven: `LLM_PROVIDER` selects the provider
//! (`openai` or `groq`), and the API key comes from the provider-specific
//! variable with `LLM_API_KEY` as a shared fallback.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Groq,
}

impl LlmProvider {
    /// Default model for the provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Groq => "llama-3.3-70b-versatile",
        }
    }

    /// Default API base URL for the provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAi => f.write_str("openai"),
            LlmProvider::Groq => f.write_str("groq"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "groq" => Ok(LlmProvider::Groq),
            other => Err(LlmError::ConfigError(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}

/// Configuration for a chat-completion client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Selected provider.
    pub provider: LlmProvider,

    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl LlmConfig {
    /// Create a configuration with provider defaults for URL and model.
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            timeout: default_timeout(),
        }
    }

    /// Build a configuration from the environment.
    ///
    /// `LLM_PROVIDER` selects the provider (default `groq`; unknown values
    /// also fall back to `groq`). The API key is read from the
    /// provider-specific variable, then `LLM_API_KEY`. `LLM_MODEL`
    /// overrides the provider's default model.
    pub fn from_env() -> Result<Self> {
        let provider = std::env::var("LLM_PROVIDER")
            .ok()
            .and_then(|s| s.parse::<LlmProvider>().ok())
            .unwrap_or(LlmProvider::Groq);

        let api_key = std::env::var(provider.api_key_var())
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .map_err(|_| {
                LlmError::ApiKeyNotFound(format!(
                    "Set {} or LLM_API_KEY",
                    provider.api_key_var()
                ))
            })?;

        let mut config = Self::new(provider, api_key);
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
