//! Conversation-context handling for follow-up queries

use super::classify::is_vague;
use super::types::MemoryEntry;

/// Entries below this confidence are not used as context
pub const MIN_MEMORY_CONFIDENCE: f64 = 0.6;

/// At most this many trusted entries are kept
pub const MAX_MEMORY_ENTRIES: usize = 3;

/// Keep the last `MAX_MEMORY_ENTRIES` entries with confidence at or above
/// `MIN_MEMORY_CONFIDENCE`, in their original order.
pub fn filter_memory(memory: &[MemoryEntry]) -> Vec<MemoryEntry> {
    let trusted: Vec<&MemoryEntry> = memory
        .iter()
        .filter(|entry| entry.confidence >= MIN_MEMORY_CONFIDENCE)
        .collect();

    let skip = trusted.len().saturating_sub(MAX_MEMORY_ENTRIES);
    trusted.into_iter().skip(skip).cloned().collect()
}

/// Rewrite a vague follow-up into an elaboration request on the most
/// recent non-blank topic. The first question of a session (empty memory)
/// and any non-vague query pass through unchanged.
pub fn build_effective_query(query: &str, memory: &[MemoryEntry]) -> String {
    let latest = memory
        .iter()
        .rev()
        .map(|entry| entry.topic.trim())
        .find(|topic| !topic.is_empty());

    match latest {
        Some(topic) if is_vague(query) => format!("Explain {} in detail.", topic),
        _ => query.to_string(),
    }
}
