//! LLM provider implementations for scribe.
//!
//! This crate provides chat-completion clients behind the provider-agnostic
//! [`ChatClient`] trait. The orchestration layers depend on the trait only;
//! the concrete provider is selected at startup from the environment.
//!
//! # Supported Providers
//!
//! - **OpenAI** — `gpt-4o-mini` by default
//! - **Groq** — `llama-3.3-70b-versatile` by default, OpenAI-compatible API
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::{client_from_env, ChatClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = client_from_env()?;
//!     let text = client.complete("What is Rust?", 0.3).await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod remote;

pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, Result};
pub use remote::{GroqClient, OpenAiClient};

use async_trait::async_trait;
use std::sync::Arc;

/// Minimal provider-agnostic interface for single-prompt completions.
///
/// Implementations must be `Send + Sync`; share them across workers with
/// `Arc<dyn ChatClient>`.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Build a client for the given configuration.
pub fn client_from_config(config: LlmConfig) -> Result<Arc<dyn ChatClient>> {
    Ok(match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
        LlmProvider::Groq => Arc::new(GroqClient::new(config)?),
    })
}

/// Build a client from the environment (see [`LlmConfig::from_env`]).
pub fn client_from_env() -> Result<Arc<dyn ChatClient>> {
    client_from_config(LlmConfig::from_env()?)
}
