//! Identity lookup configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Cache validity window used when none (or an invalid one) is configured.
pub const DEFAULT_IDENTITY_TTL_MS: u64 = 60_000;

/// Settings for the cached "who am I" lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path of the identity endpoint on the backend
    pub path: String,
    /// How long a fetched identity stays fresh
    pub cache_ttl_ms: u64,
    /// Abort the request after this long (no timeout when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Key the bearer token is stored under
    pub token_key: String,
    /// JSON file acting as persistent token storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: "/api/auth/me".to_string(),
            cache_ttl_ms: DEFAULT_IDENTITY_TTL_MS,
            timeout_ms: None,
            token_key: "token".to_string(),
            token_file: None,
        }
    }
}

impl IdentityConfig {
    /// Effective cache TTL. Zero falls back to the default.
    pub fn ttl(&self) -> Duration {
        if self.cache_ttl_ms == 0 {
            Duration::from_millis(DEFAULT_IDENTITY_TTL_MS)
        } else {
            Duration::from_millis(self.cache_ttl_ms)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

/// Parse a TTL override. Only positive finite numbers are accepted.
pub fn parse_ttl_override(raw: &str) -> Option<u64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value.ceil() as u64)
    } else {
        None
    }
}
