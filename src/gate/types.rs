//! Request and response types for the query gate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Search mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Answer-oriented search, scored for confidence
    Ai,
    /// Result-list search
    Web,
}

impl SearchMode {
    /// Parse a wire value. Only the exact lowercase names are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ai" => Some(Self::Ai),
            "web" => Some(Self::Web),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of caller-held conversation history.
///
/// The gate only reads these; the client owns and stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Topic of a previous question
    pub topic: String,
    /// Confidence the previous answer was scored with
    pub confidence: f64,
}

impl MemoryEntry {
    pub fn new(topic: impl Into<String>, confidence: f64) -> Self {
        Self {
            topic: topic.into(),
            confidence,
        }
    }
}

/// Raw search request as received on the wire.
///
/// Fields are loosely typed so that a missing or non-string `query` or
/// `mode` can be answered with the fixed validation text instead of a
/// framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<serde_json::Value>,
    #[serde(default)]
    pub mode: Option<serde_json::Value>,
    #[serde(default)]
    pub memory: Option<serde_json::Value>,
}

impl SearchRequest {
    /// Build a well-formed request (used by tests and embedders)
    pub fn new(query: &str, mode: SearchMode, memory: &[MemoryEntry]) -> Self {
        Self {
            query: Some(serde_json::Value::String(query.to_string())),
            mode: Some(serde_json::Value::String(mode.as_str().to_string())),
            memory: serde_json::to_value(memory).ok(),
        }
    }

    /// The query text if present, a string, and not blank
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_ref()
            .and_then(|q| q.as_str())
            .filter(|q| !q.trim().is_empty())
    }

    /// The requested mode if it is one of the known names
    pub fn search_mode(&self) -> Option<SearchMode> {
        self.mode
            .as_ref()
            .and_then(|m| m.as_str())
            .and_then(SearchMode::parse)
    }

    /// Memory entries, skipping any that are not `{topic, confidence}`
    pub fn memory_entries(&self) -> Vec<MemoryEntry> {
        match &self.memory {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Normalized answer payload returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<serde_json::Value>>,
}

impl SearchResponse {
    /// Answer carrying a confidence score and no results
    pub fn scored(answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            answer: answer.into(),
            confidence: Some(confidence),
            results: None,
        }
    }

    /// Answer with neither confidence nor results
    pub fn plain(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            confidence: None,
            results: None,
        }
    }

    pub fn with_results(mut self, results: Vec<serde_json::Value>) -> Self {
        self.results = Some(results);
        self
    }
}
