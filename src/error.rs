//! Error types for the SMS gateway

use std::io;

use thiserror::Error;

use crate::validator::ValidationError;

/// Result type alias for the SMS gateway
pub type Result<T> = std::result::Result<T, Error>;

/// SMS gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Recipient or message rejected before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Shared send budget exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider did not answer within the configured timeout
    #[error("Provider timeout after {0:?}")]
    ProviderTimeout(std::time::Duration),

    /// Connection-level failure talking to the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}")]
    ProviderStatus {
        /// HTTP status code
        status: u16,
        /// Best-effort parsed error body
        body: Option<serde_json::Value>,
    },

    /// Provider answered 2xx but the body could not be parsed
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a `reqwest` failure that happened before a response arrived.
    #[must_use]
    pub fn from_send(err: &reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            Self::ProviderTimeout(timeout)
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Whether this error is transient for the given set of retryable statuses.
    #[must_use]
    pub fn is_transient(&self, retry_statuses: &[u16]) -> bool {
        match self {
            Self::ProviderTimeout(_) | Self::Transport(_) | Self::Io(_) => true,
            Self::ProviderStatus { status, .. } => retry_statuses.contains(status),
            _ => false,
        }
    }

    /// Best-effort provider payload attached to this error, if any.
    #[must_use]
    pub fn provider_body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::ProviderStatus { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
