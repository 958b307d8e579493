//! Provider error taxonomy.
//!
//! A failed fetch is never treated as "no matches": every error here makes
//! the sync run fail rather than mark listings unavailable.

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("provider server error (status {status})")]
    Server { status: u16 },

    #[error("provider rejected the request: {message}")]
    BadRequest { message: String },

    #[error("search radius must be a positive number of miles, got {radius_miles:?}")]
    InvalidRadius { radius_miles: Option<f64> },

    #[error("provider authentication failed (status {status})")]
    Auth { status: u16 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits, timeouts, 5xx responses and transport hiccups are
    /// transient; bad requests, auth failures and decode errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited | Self::Server { .. } | Self::Transport(_)
        )
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Self::Timeout,
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
