//! SearchGate error types
//!
//! Domain-level failures (invalid input, quota exhaustion, upstream outages)
//! never reach the HTTP caller as errors; the gate turns them into fixed
//! answer text. This type covers everything below that boundary.

use thiserror::Error;

/// SearchGate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream search provider returned something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for SearchGate operations
pub type Result<T> = std::result::Result<T, Error>;
