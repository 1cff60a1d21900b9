//! Environment-driven server configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Runtime settings for the scribe server
///
/// All values are environment-driven with sensible defaults; the LLM
/// provider selection lives in `llm::LlmConfig::from_env`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite connection string for tasks, checkpoints, and workspaces
    pub database_url: String,

    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Number of dispatcher worker executors
    pub worker_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:scribe.db?mode=rwc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            worker_count: 4,
        }
    }
}

impl Settings {
    /// Load settings from the environment
    ///
    /// Recognized variables: `DATABASE_URL`, `HOST`, `PORT`, `WORKER_COUNT`.
    /// Unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            worker_count: std::env::var("WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_count),
        }
    }

    /// Socket address to bind the HTTP server to
    pub fn server_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.worker_count, 4);
        assert!(settings.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        let addr = settings.server_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
