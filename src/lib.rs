//! SearchGate - quota-gated search relay
//!
//! SearchGate sits between a chat-style search frontend and a third-party
//! search API. Each request is answered by the [`gate::QueryGate`], which
//! may reply without ever calling the provider.
//!
//! ## Architecture
//!
//! ```text
//!   POST /api/search
//!          │
//!   ┌──────▼───────────────────────────────────────────┐
//!   │                    Query Gate                    │
//!   │  validate ─► identity? ─► mode ─► quota ─► rewrite│
//!   └──────┬───────────────────────────────────┬───────┘
//!          │ canned / limit / invalid reply     │ effective query
//!          ▼                                    ▼
//!      response                     ┌───────────────────┐
//!                                   │ SearchProvider    │
//!                                   │ (Tavily or mock)  │
//!                                   └─────────┬─────────┘
//!                                             ▼
//!                                    confidence scoring
//! ```
//!
//! ## Modules
//!
//! - [`api`]: axum router and handlers
//! - [`gate`]: classification, context rewriting, quotas, scoring
//! - [`upstream`]: search provider trait and HTTP client
//! - [`config`]: configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod upstream;

pub use config::RelayConfig;
pub use error::{Error, Result};
