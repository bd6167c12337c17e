//! Event stream configuration

use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the live event log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

/// Settings for the server-sent-events subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Path of the SSE endpoint on the backend
    pub path: String,
    /// Delay before the first reconnect attempt
    pub base_delay_ms: u64,
    /// Upper bound for any single reconnect delay
    pub max_delay_ms: u64,
    /// Keep cookies across requests
    pub with_credentials: bool,
    /// Entries retained by the event log (newest first)
    pub event_log_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            path: "/api/events".to_string(),
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            with_credentials: true,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}
