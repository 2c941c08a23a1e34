//! Request orchestration: admission, normalization, delivery

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span};

use crate::config::Config;
use crate::correlation;
use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::failsafe::SlidingWindowLimiter;
use crate::stats::{DeliveryStats, RequestState, StatsSnapshot};
use crate::validator::normalize_recipient;
use crate::{Error, Result};

/// Sender id recorded when the caller does not identify itself
pub const DEFAULT_SENDER_ID: &str = "unknown";

/// One inbound delivery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Recipient phone number, with or without the leading `+`
    pub recipient: String,
    /// Message body
    pub message: String,
    /// Subject; the provider default applies when absent
    pub subject: Option<String>,
    /// Caller identifier, for logging only
    pub sender_id: String,
}

impl DeliveryRequest {
    /// Create a request with no subject and the default sender id
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
            subject: None,
            sender_id: DEFAULT_SENDER_ID.to_string(),
        }
    }

    /// Set the subject
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the caller identifier
    #[must_use]
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }
}

/// Result of [`SmsGateway::handle`]
#[derive(Debug, Clone, PartialEq)]
pub struct HandleOutcome {
    /// Normalized outcome returned to the caller
    pub outcome: DeliveryOutcome,
    /// Correlation id minted for this request
    pub correlation_id: String,
    /// Whether the shared rate limiter admitted the request
    pub admitted: bool,
    /// Terminal state
    pub state: RequestState,
}

/// Gateway core shared by all inbound requests
pub struct SmsGateway {
    limiter: Arc<SlidingWindowLimiter>,
    client: DeliveryClient,
    stats: DeliveryStats,
}

impl SmsGateway {
    /// Build the limiter and delivery client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_limiter(
            Arc::new(SlidingWindowLimiter::new(&config.rate_limit)),
            DeliveryClient::new(config)?,
        ))
    }

    /// Assemble from an existing limiter, e.g. one on a manual clock
    #[must_use]
    pub fn with_limiter(limiter: Arc<SlidingWindowLimiter>, client: DeliveryClient) -> Self {
        Self {
            limiter,
            client,
            stats: DeliveryStats::new(),
        }
    }

    /// Shared rate limiter
    #[must_use]
    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle one request end to end. Never fails; every error becomes an outcome.
    pub async fn handle(&self, request: DeliveryRequest) -> HandleOutcome {
        let correlation_id = correlation::generate();
        let span = info_span!(
            "sms_request",
            request_id = %correlation_id,
            sender_id = %request.sender_id
        );

        let recipient = normalize_recipient(&request.recipient);
        let (outcome, admitted, state) =
            correlation::scope(correlation_id.clone(), self.process(&request, &recipient))
                .instrument(span)
                .await;

        self.stats.record(state);
        info!(
            request_id = %correlation_id,
            sender_id = %request.sender_id,
            recipient = %recipient,
            subject = ?request.subject,
            status = ?outcome.status,
            state = ?state,
            "NOTIFICATION"
        );

        HandleOutcome {
            outcome,
            correlation_id,
            admitted,
            state,
        }
    }

    async fn process(
        &self,
        request: &DeliveryRequest,
        recipient: &str,
    ) -> (DeliveryOutcome, bool, RequestState) {
        if !self.limiter.admit() {
            info!(limit = self.limiter.limit(), "Rate limit exceeded");
            return (
                DeliveryOutcome::from_error(&Error::RateLimited),
                false,
                RequestState::RateLimited,
            );
        }

        info!(recipient = %recipient, subject = ?request.subject, "Sending SMS");

        let result = self
            .client
            .deliver(recipient, &request.message, request.subject.as_deref())
            .await;

        let state = match &result {
            Ok(_) => RequestState::Delivered,
            Err(Error::Validation(_)) => RequestState::Rejected,
            Err(_) => RequestState::DeliveryFailed,
        };
        (DeliveryOutcome::from(result), true, state)
    }
}
