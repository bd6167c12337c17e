//! Connection lifecycle state, endpoint description and backoff policy.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a stream subscription, as shown by status chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Retrying,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Retrying => "retrying",
            ConnectionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Reconnect bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetryState {
    /// Errors seen since the last successful open
    pub attempt: u32,
    /// Delay before the pending reconnect, if one is scheduled
    pub next_delay_ms: Option<u64>,
}

impl RetryState {
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.next_delay_ms = None;
    }
}

/// Exponential backoff capped at a maximum delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
        }
    }
}

impl Backoff {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    ///
    /// `min(max_delay_ms, base_delay_ms * 2^(attempt - 1))`; attempt 0 is
    /// treated like attempt 1.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let exp = attempt.saturating_sub(1).min(63);
        let factor = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }
}

/// Description of the resolved stream endpoint and its connection history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectionInfo {
    pub url: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub default_port: Option<u16>,
    pub path: Option<String>,
    pub with_credentials: bool,
    pub opened_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub initialization_failed: bool,
}

/// Partial update merged into [`ConnectionInfo`]. `None` fields are left
/// untouched; `disconnected_at: Some(None)` clears the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionInfoUpdate {
    pub url: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub default_port: Option<u16>,
    pub path: Option<String>,
    pub with_credentials: Option<bool>,
    pub opened_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<Option<DateTime<Utc>>>,
    pub initialization_failed: Option<bool>,
}

impl ConnectionInfoUpdate {
    /// Snapshot of a resolved endpoint.
    ///
    /// Falls back to the raw string when the URL cannot be described.
    pub fn endpoint(raw: &str, resolved: Option<&Url>, with_credentials: bool) -> Self {
        let mut update = Self {
            url: Some(raw.to_string()),
            with_credentials: Some(with_credentials),
            initialization_failed: Some(false),
            ..Default::default()
        };

        if let Some(url) = resolved.filter(|u| u.has_host()) {
            update.url = Some(url.to_string());
            update.protocol = Some(format!("{}:", url.scheme()));
            update.host = url.host_str().map(String::from);
            update.default_port = default_port(url.scheme());
            update.port = url.port_or_known_default();
            update.path = Some(url.path().to_string());
        }

        update
    }

    pub fn initialization_failed() -> Self {
        Self {
            initialization_failed: Some(true),
            ..Default::default()
        }
    }

    pub fn opened(at: DateTime<Utc>) -> Self {
        Self {
            opened_at: Some(at),
            disconnected_at: Some(None),
            ..Default::default()
        }
    }

    pub fn disconnected(at: DateTime<Utc>) -> Self {
        Self {
            disconnected_at: Some(Some(at)),
            ..Default::default()
        }
    }
}

impl ConnectionInfo {
    /// Merge a partial update; unspecified fields keep their value.
    pub fn merge(&mut self, update: &ConnectionInfoUpdate) {
        if let Some(url) = &update.url {
            self.url = Some(url.clone());
        }
        if let Some(protocol) = &update.protocol {
            self.protocol = Some(protocol.clone());
        }
        if let Some(host) = &update.host {
            self.host = Some(host.clone());
        }
        if let Some(port) = update.port {
            self.port = Some(port);
        }
        if let Some(default_port) = update.default_port {
            self.default_port = Some(default_port);
        }
        if let Some(path) = &update.path {
            self.path = Some(path.clone());
        }
        if let Some(with_credentials) = update.with_credentials {
            self.with_credentials = with_credentials;
        }
        if let Some(opened_at) = update.opened_at {
            self.opened_at = Some(opened_at);
        }
        if let Some(disconnected_at) = update.disconnected_at {
            self.disconnected_at = disconnected_at;
        }
        if let Some(failed) = update.initialization_failed {
            self.initialization_failed = failed;
        }
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}
