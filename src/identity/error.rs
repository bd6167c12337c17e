//! Error types for identity lookups.

use thiserror::Error;

/// Failures of the identity request itself.
///
/// Having no token and being told the token is no longer valid (HTTP 401)
/// are not errors; see [`super::IdentityOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Request aborted after the configured timeout
    #[error("identity request timed out after {0}ms")]
    Timeout(u64),

    /// Server answered with a non-success status other than 401
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Request could not be sent or the connection failed
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not a JSON document
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Token storage could not be read or written
    #[error("token storage error: {0}")]
    Storage(String),
}

impl IdentityError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, IdentityError::Timeout(_))
    }
}
