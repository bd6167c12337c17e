//! Single-slot identity cache entry.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Wall-clock time the entry was stored
    pub timestamp: DateTime<Utc>,
    /// Monotonic time the entry was stored, used for expiry
    pub stored_at: Instant,
    pub data: Value,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            stored_at: Instant::now(),
            data,
        }
    }

    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// Fresh while strictly younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
