//! Query Gate: decides how each search request is answered
//!
//! Every request passes through the same fixed sequence:
//!
//! 1. Validate the query (missing, non-string, or blank → fixed reply)
//! 2. Identity check (canned reply, no quota, no upstream call)
//! 3. Validate the mode
//! 4. Consume per-origin quota for the mode
//! 5. Rewrite vague follow-ups using conversation memory (AI mode)
//! 6. Call the upstream provider, or answer with a mock when no key is set
//! 7. Score confidence (AI mode)
//!
//! Domain failures never surface as errors; they become fixed answer text.

pub mod classify;
pub mod confidence;
pub mod context;
pub mod quota;
pub mod types;

pub use classify::{is_vague, QueryClassifier, QueryKind};
pub use confidence::score_confidence;
pub use context::{build_effective_query, filter_memory};
pub use quota::{Clock, ManualClock, QuotaLimiter, SystemClock, UsageCounter};
pub use types::{MemoryEntry, SearchMode, SearchRequest, SearchResponse};

use crate::config::RelayConfig;
use crate::upstream::{SearchProvider, UpstreamQuery};
use std::sync::Arc;

pub const INVALID_QUERY_ANSWER: &str = "Invalid query.";
pub const INVALID_MODE_ANSWER: &str = "Invalid mode.";
pub const AI_LIMIT_ANSWER: &str = "Daily AI search limit reached. Please try again tomorrow.";
pub const WEB_LIMIT_ANSWER: &str = "Daily web search limit reached. Please try again tomorrow.";
pub const AI_NETWORK_ERROR_ANSWER: &str = "Network error while searching. Please try again.";
pub const WEB_NETWORK_ERROR_ANSWER: &str = "Web search failed. Please try again.";
pub const NO_ANSWER_FALLBACK: &str = "No answer found.";

/// Confidence reported for mock answers
pub const MOCK_CONFIDENCE: f64 = 0.3;

/// The query gate service
pub struct QueryGate {
    classifier: QueryClassifier,
    quota: QuotaLimiter,
    provider: Option<Arc<dyn SearchProvider>>,
    identity_answer: String,
    ai_max_results: u32,
    web_max_results: u32,
}

impl QueryGate {
    /// Create a gate on the system clock.
    ///
    /// With `provider` set to `None` every search is answered with a mock.
    pub fn new(config: &RelayConfig, provider: Option<Arc<dyn SearchProvider>>) -> Self {
        Self::with_quota(config, provider, QuotaLimiter::new(&config.quota))
    }

    /// Create a gate with an explicit quota limiter
    pub fn with_quota(
        config: &RelayConfig,
        provider: Option<Arc<dyn SearchProvider>>,
        quota: QuotaLimiter,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(&config.identity),
            quota,
            provider,
            identity_answer: config.identity.answer.clone(),
            ai_max_results: config.upstream.ai_max_results,
            web_max_results: config.upstream.web_max_results,
        }
    }

    /// Quota limiter backing this gate
    pub fn quota(&self) -> &QuotaLimiter {
        &self.quota
    }

    /// Whether a real upstream provider is configured
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Answer one search request from `origin`
    pub async fn handle(&self, origin: &str, request: &SearchRequest) -> SearchResponse {
        let Some(query) = request.query_text() else {
            tracing::debug!(origin, "Rejecting request without a usable query");
            return SearchResponse::scored(INVALID_QUERY_ANSWER, 0.0);
        };

        let kind = self.classifier.classify(query);
        if kind == QueryKind::Identity {
            tracing::debug!(origin, "Answering identity question");
            return SearchResponse::scored(self.identity_answer.clone(), 1.0);
        }

        let Some(mode) = request.search_mode() else {
            tracing::debug!(origin, mode = ?request.mode, "Rejecting unknown mode");
            return SearchResponse::scored(INVALID_MODE_ANSWER, 0.0);
        };

        if !self.quota.check_and_consume(origin, mode) {
            tracing::info!(origin, %mode, "Daily quota reached");
            return match mode {
                SearchMode::Ai => SearchResponse::scored(AI_LIMIT_ANSWER, 0.0),
                SearchMode::Web => SearchResponse::plain(WEB_LIMIT_ANSWER),
            };
        }

        match mode {
            SearchMode::Ai => {
                self.search_ai(origin, query, kind, &request.memory_entries())
                    .await
            }
            SearchMode::Web => self.search_web(origin, query).await,
        }
    }

    async fn search_ai(
        &self,
        origin: &str,
        query: &str,
        kind: QueryKind,
        memory: &[MemoryEntry],
    ) -> SearchResponse {
        let effective = match kind {
            QueryKind::Vague => build_effective_query(query, &filter_memory(memory)),
            _ => query.to_string(),
        };
        if effective != query {
            tracing::debug!(origin, effective = %effective, "Rewrote vague follow-up");
        }

        let Some(provider) = &self.provider else {
            return mock_response(query);
        };

        let upstream = UpstreamQuery {
            query: effective,
            max_results: self.ai_max_results,
        };
        match provider.search(&upstream).await {
            Ok(result) => {
                let answer = result.answer.unwrap_or_default();
                let confidence = score_confidence(&answer);
                let answer = if answer.is_empty() {
                    NO_ANSWER_FALLBACK.to_string()
                } else {
                    answer
                };
                SearchResponse::scored(answer, confidence)
                    .with_results(result.results.unwrap_or_default())
            }
            Err(e) => {
                tracing::warn!(origin, provider = provider.name(), "AI search failed: {}", e);
                SearchResponse::scored(AI_NETWORK_ERROR_ANSWER, 0.0)
            }
        }
    }

    async fn search_web(&self, origin: &str, query: &str) -> SearchResponse {
        let Some(provider) = &self.provider else {
            return mock_response(query);
        };

        let upstream = UpstreamQuery {
            query: query.to_string(),
            max_results: self.web_max_results,
        };
        match provider.search(&upstream).await {
            Ok(result) => SearchResponse::plain(result.answer.unwrap_or_default())
                .with_results(result.results.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(origin, provider = provider.name(), "Web search failed: {}", e);
                SearchResponse::plain(WEB_NETWORK_ERROR_ANSWER)
            }
        }
    }
}

/// Development answer used when no upstream key is configured
fn mock_response(query: &str) -> SearchResponse {
    SearchResponse::scored(
        format!(
            "[Mock answer] No search API key is configured. You asked: \"{}\"",
            query
        ),
        MOCK_CONFIDENCE,
    )
    .with_results(Vec::new())
}
