//! SearchGate configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main SearchGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream search provider configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-origin daily quotas
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Identity-question interception
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            max_body_size: 65_536,
            request_timeout_secs: 120,
        }
    }
}

/// Upstream search provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider base URL; requests go to `{base_url}/search`
    pub base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Value sent as `search_depth`
    pub search_depth: String,

    /// `max_results` for AI-mode searches
    pub ai_max_results: u32,

    /// `max_results` for web-mode searches
    pub web_max_results: u32,

    /// Outbound request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            search_depth: "advanced".to_string(),
            ai_max_results: 5,
            web_max_results: 8,
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    /// Resolve the API key from the environment.
    ///
    /// Tries the configured variable name as written, then its UPPER_CASE
    /// form. Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .or_else(|_| std::env::var(self.api_key_env.to_uppercase()))
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Per-origin daily quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// AI-mode requests allowed per origin per window
    pub ai_per_day: u32,

    /// Web-mode requests allowed per origin per window
    pub web_per_day: u32,

    /// Length of the shared reset window in seconds
    pub window_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            ai_per_day: 20,
            web_per_day: 100,
            window_secs: 24 * 60 * 60,
        }
    }
}

/// Identity-question interception configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Canned answer returned for identity questions
    pub answer: String,

    /// Phrases that must match the whole normalized query
    pub phrases: Vec<String>,

    /// Phrases that match anywhere inside the normalized query
    pub substrings: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            answer: "I'm SearchGate, a search assistant that answers questions \
                     using live web results. I was built by an independent developer."
                .to_string(),
            phrases: default_identity_phrases(),
            substrings: vec!["your creator".to_string(), "who developed you".to_string()],
        }
    }
}

/// Default exact-match identity phrases
pub fn default_identity_phrases() -> Vec<String> {
    [
        "who are you",
        "who are you?",
        "what are you",
        "what are you?",
        "who made you",
        "who made you?",
        "who created you",
        "who created you?",
        "who built you",
        "who built you?",
        "what is your name",
        "what is your name?",
        "what's your name",
        "what's your name?",
        "are you an ai",
        "are you an ai?",
        "introduce yourself",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl RelayConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Render configuration as TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Apply environment overrides (`PORT`)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT override"),
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(Error::Config("upstream.base_url is required".to_string()));
        }

        for (name, value) in [
            ("upstream.ai_max_results", self.upstream.ai_max_results),
            ("upstream.web_max_results", self.upstream.web_max_results),
        ] {
            if !(1..=20).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 1 and 20, got {}",
                    name, value
                )));
            }
        }

        if self.quota.ai_per_day == 0 || self.quota.web_per_day == 0 {
            return Err(Error::Config(
                "quota limits must be greater than zero".to_string(),
            ));
        }

        if self.quota.window_secs == 0 {
            return Err(Error::Config(
                "quota.window_secs must be greater than zero".to_string(),
            ));
        }

        if self.server.request_timeout_secs == 0 || self.upstream.timeout_secs == 0 {
            return Err(Error::Config(
                "server.request_timeout_secs and upstream.timeout_secs must be greater than zero"
                    .to_string(),
            ));
        }

        // The upstream call must time out first so the gate can still answer 200.
        if self.upstream.timeout_secs >= self.server.request_timeout_secs {
            return Err(Error::Config(format!(
                "upstream.timeout_secs ({}) must be less than server.request_timeout_secs ({})",
                self.upstream.timeout_secs, self.server.request_timeout_secs
            )));
        }

        if self.identity.answer.trim().is_empty() {
            return Err(Error::Config("identity.answer must not be empty".to_string()));
        }

        Ok(())
    }
}
