use thiserror::Error;

/// Errors surfaced by the progress API client.
///
/// Every failure reaches the caller carrying its category; nothing is
/// retried, swallowed, or replaced with a default value.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller passed malformed local input; no request was issued
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection failure or timeout. The event may or may not have been
    /// recorded server-side (at-most-once from the client)
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status, with the response text attached
    #[error("Server error {0}: {1}")]
    Status(u16, String),

    /// A received response failed shape validation
    #[error("{0}")]
    Validation(String),

    /// A parseable response violating the wire contract
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// True when the failure is about reaching the server rather than about
    /// what it sent back.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Status(..))
    }
}
