//! Upstream search provider
//!
//! The gate talks to the provider through the [`SearchProvider`] trait so
//! tests can substitute a scripted provider. [`TavilyClient`] is the HTTP
//! implementation.

mod tavily;

pub use tavily::TavilyClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query sent to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamQuery {
    pub query: String,
    pub max_results: u32,
}

/// Fields of the provider response the gate consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<serde_json::Value>>,
}

/// A remote search service
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Run one search
    async fn search(&self, query: &UpstreamQuery) -> Result<UpstreamAnswer>;
}
