//! Query classification: identity questions and vague follow-ups
//!
//! Rules are evaluated in a fixed order: identity first, then vague, then
//! everything else is normal. All matching happens on the trimmed,
//! lowercased query.

use crate::config::IdentityConfig;
use std::collections::HashSet;

/// Single-word commands treated as "tell me more about the last topic"
pub const VAGUE_WORDS: &[&str] = &["explain", "more", "why", "how", "details", "elaborate"];

/// Outcome of classifying a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Asks about the assistant itself; answered with a canned reply
    Identity,
    /// Bare follow-up command that needs prior context
    Vague,
    /// Anything else
    Normal,
}

/// Classifier for incoming queries
pub struct QueryClassifier {
    phrases: HashSet<String>,
    substrings: Vec<String>,
}

impl QueryClassifier {
    /// Create a classifier from identity rules
    pub fn new(identity: &IdentityConfig) -> Self {
        Self {
            phrases: identity.phrases.iter().map(|p| normalize(p)).collect(),
            substrings: identity
                .substrings
                .iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Classify a query
    pub fn classify(&self, query: &str) -> QueryKind {
        if self.is_identity(query) {
            QueryKind::Identity
        } else if is_vague(query) {
            QueryKind::Vague
        } else {
            QueryKind::Normal
        }
    }

    /// True if the query asks about the assistant's own nature or creator.
    ///
    /// Phrases must match the whole query; substrings may appear anywhere.
    pub fn is_identity(&self, query: &str) -> bool {
        let q = normalize(query);
        self.phrases.contains(&q) || self.substrings.iter().any(|s| q.contains(s.as_str()))
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(&IdentityConfig::default())
    }
}

/// True if the query is exactly one of the vague single-word commands
pub fn is_vague(query: &str) -> bool {
    let q = normalize(query);
    VAGUE_WORDS.contains(&q.as_str())
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
