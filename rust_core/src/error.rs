//! Typed errors for the collaborator seams.
//!
//! The reconciliation loop only needs to tell "the query failed, skip this
//! tick" apart from "one channel operation failed", so each seam gets its own
//! enum and callers never inspect transport internals.

pub use reqwest::StatusCode;

/// Failure to fetch the live broadcast set.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The API circuit breaker is open; no request was sent.
    #[error("{api} circuit breaker is open")]
    CircuitOpen { api: String },

    /// Could not obtain or use credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Upstream throttled the request.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Non-2xx response other than auth and rate limiting.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failure of a single post or delete against the notification channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("chat session is not connected")]
    NotConnected,

    #[error("could not find channel '{0}'")]
    ChannelNotFound(String),

    #[error("channel '{0}' is not a text channel")]
    NotTextChannel(String),

    /// Already deleted, or never existed.
    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ChannelError {
    /// True when the target message is already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChannelError::MessageNotFound(_))
    }
}
