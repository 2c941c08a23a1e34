//! Normalized delivery results

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::Error;

/// Error text returned for any recipient/message validation failure
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid phone number format";

/// Outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Provider accepted the message
    Success,
    /// Validation, admission, or delivery failed
    Error,
}

/// Structured result of a delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Success or error
    pub status: DeliveryStatus,
    /// Human-readable error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider payload: the parsed body on success, best-effort error body otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl DeliveryOutcome {
    /// Provider accepted the message
    #[must_use]
    pub fn success(response: Value) -> Self {
        Self {
            status: DeliveryStatus::Success,
            error: None,
            response: Some(response),
        }
    }

    /// Error with no provider payload
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Error,
            error: Some(message.into()),
            response: None,
        }
    }

    /// Convert a failure into its caller-facing outcome
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Validation(_) => Self::error(INVALID_REQUEST_MESSAGE),
            Error::RateLimited => Self::error(err.to_string()),
            other => Self {
                status: DeliveryStatus::Error,
                error: Some(other.to_string()),
                response: Some(other.provider_body().cloned().unwrap_or_else(|| json!({}))),
            },
        }
    }

    /// Whether the provider accepted the message
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

impl From<crate::Result<Value>> for DeliveryOutcome {
    fn from(result: crate::Result<Value>) -> Self {
        match result {
            Ok(body) => Self::success(body),
            Err(e) => Self::from_error(&e),
        }
    }
}
