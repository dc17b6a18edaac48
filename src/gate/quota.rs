//! Per-origin daily quotas with a shared reset window
//!
//! All origins share one window: once it has elapsed, every counter is
//! zeroed together on the next check. The check, reset, and increment run
//! under a single lock so concurrent requests from one origin can never be
//! admitted past the limit.

use super::types::SearchMode;
use crate::config::QuotaConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Requests consumed by one origin in the current window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounter {
    pub ai: u32,
    pub web: u32,
}

impl UsageCounter {
    fn get(&self, mode: SearchMode) -> u32 {
        match mode {
            SearchMode::Ai => self.ai,
            SearchMode::Web => self.web,
        }
    }

    fn increment(&mut self, mode: SearchMode) {
        match mode {
            SearchMode::Ai => self.ai += 1,
            SearchMode::Web => self.web += 1,
        }
    }
}

struct QuotaTable {
    counters: HashMap<String, UsageCounter>,
    window_started: Instant,
}

/// Quota gate keyed by origin identifier
pub struct QuotaLimiter {
    ai_limit: u32,
    web_limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    table: Mutex<QuotaTable>,
}

impl QuotaLimiter {
    /// Create a limiter on the system clock
    pub fn new(config: &QuotaConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter reading time from `clock`
    pub fn with_clock(config: &QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        let window_started = clock.now();
        Self {
            ai_limit: config.ai_per_day,
            web_limit: config.web_per_day,
            window: Duration::from_secs(config.window_secs),
            clock,
            table: Mutex::new(QuotaTable {
                counters: HashMap::new(),
                window_started,
            }),
        }
    }

    /// Limit for a mode
    pub fn limit(&self, mode: SearchMode) -> u32 {
        match mode {
            SearchMode::Ai => self.ai_limit,
            SearchMode::Web => self.web_limit,
        }
    }

    /// Admit one request for `origin` in `mode`, consuming quota.
    ///
    /// Returns false, without consuming anything, once the origin has used
    /// its limit for that mode in the current window.
    pub fn check_and_consume(&self, origin: &str, mode: SearchMode) -> bool {
        let now = self.clock.now();
        let mut table = self.table.lock();

        if now.saturating_duration_since(table.window_started) >= self.window {
            tracing::info!(
                origins = table.counters.len(),
                "Quota window elapsed, resetting all counters"
            );
            table.counters.clear();
            table.window_started = now;
        }

        let limit = self.limit(mode);
        let counter = table.counters.entry(origin.to_owned()).or_default();
        if counter.get(mode) >= limit {
            tracing::debug!(origin, %mode, limit, "Quota exhausted");
            return false;
        }

        counter.increment(mode);
        true
    }

    /// Current counters for an origin (zero if it has not been seen)
    pub fn usage(&self, origin: &str) -> UsageCounter {
        self.table
            .lock()
            .counters
            .get(origin)
            .copied()
            .unwrap_or_default()
    }

    /// Number of origins tracked in the current window
    pub fn tracked_origins(&self) -> usize {
        self.table.lock().counters.len()
    }

    /// Zero every counter and restart the window now
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut table = self.table.lock();
        table.counters.clear();
        table.window_started = now;
    }
}
