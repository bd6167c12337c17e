//! Events emitted by a stream subscription

use super::error::StreamError;
use super::state::ConnectionInfoUpdate;
use serde_json::Value;
use std::time::Duration;

/// Everything a consumer learns about a subscription arrives as one of these,
/// in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A connection attempt is starting
    Connecting {
        /// Errors seen since the last successful open
        attempt: u32,
    },
    /// The stream is open and delivering messages
    Open,
    /// A message whose data parsed as JSON
    Message(Value),
    /// Initialization, transport or read failure
    Error(StreamError),
    /// Partial update of the endpoint description
    InfoUpdate(ConnectionInfoUpdate),
    /// A reconnect has been scheduled
    Retrying {
        /// 1-based attempt number
        attempt: u32,
        /// Time until the attempt starts
        delay: Duration,
    },
}

impl ConnectionEvent {
    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionEvent::Connecting { .. } => "connecting",
            ConnectionEvent::Open => "open",
            ConnectionEvent::Message(_) => "message",
            ConnectionEvent::Error(_) => "error",
            ConnectionEvent::InfoUpdate(_) => "info_update",
            ConnectionEvent::Retrying { .. } => "retrying",
        }
    }
}
