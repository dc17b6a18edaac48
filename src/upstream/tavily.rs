//! Tavily-compatible search client

use super::{SearchProvider, UpstreamAnswer, UpstreamQuery};
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Search client speaking the Tavily `POST /search` API
pub struct TavilyClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    search_depth: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    max_results: u32,
}

impl TavilyClient {
    /// Create a client for the configured provider with the given key
    pub fn new(config: &UpstreamConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/search", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            search_depth: config.search_depth.clone(),
        })
    }

    /// Full URL searches are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &UpstreamQuery) -> Result<UpstreamAnswer> {
        let payload = TavilyRequest {
            api_key: &self.api_key,
            query: &query.query,
            search_depth: &self.search_depth,
            include_answer: true,
            max_results: query.max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "search API returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Upstream(format!(
                "failed to parse search response: {} (first 200 chars: {})",
                e,
                text.chars().take(200).collect::<String>()
            ))
        })
    }
}
