//! Error types for the event stream.

use thiserror::Error;

/// Errors reported by a stream subscription.
///
/// None of these are fatal: every one of them is followed by a scheduled
/// reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The endpoint could not be turned into a request
    #[error("failed to initialize stream: {0}")]
    Initialization(String),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connection(String),

    /// Server answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// Server ended the stream
    #[error("stream closed by server")]
    Closed,

    /// Reading the stream body failed
    #[error("stream read failed: {0}")]
    Body(String),
}

impl StreamError {
    /// True when the failure happened before any connection existed.
    pub fn is_initialization(&self) -> bool {
        matches!(self, StreamError::Initialization(_))
    }

    pub(crate) fn from_request(e: reqwest::Error) -> Self {
        if e.is_builder() {
            StreamError::Initialization(e.to_string())
        } else {
            StreamError::Connection(e.to_string())
        }
    }
}
