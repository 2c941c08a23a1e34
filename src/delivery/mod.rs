//! Outbound delivery to the HelloSMS provider
//!
//! Each send is validated locally, then POSTed as JSON with HTTP Basic
//! credentials. Transport failures, timeouts, and retryable statuses are
//! retried with backoff; the caller only ever sees the final outcome.

mod outcome;

pub use outcome::{DeliveryOutcome, DeliveryStatus, INVALID_REQUEST_MESSAGE};

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::correlation::{self, CORRELATION_HEADER};
use crate::failsafe::{RetryPolicy, with_retry};
use crate::validator::Validator;
use crate::{Error, Result};

/// Request body expected by the provider
#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    to: [&'a str; 1],
    from: &'a str,
    subject: &'a str,
    message: &'a str,
    priority: &'static str,
}

/// Authenticated HTTP client for the provider's send endpoint
pub struct DeliveryClient {
    /// HTTP client (connection pool shared across requests)
    client: Client,
    /// Send endpoint
    api_url: String,
    /// Precomputed `Basic` credential
    auth_header: HeaderValue,
    /// Sender name
    sender: String,
    /// Subject used when none is given
    default_subject: String,
    /// Per-attempt timeout
    timeout: Duration,
    validator: Validator,
    retry: RetryPolicy,
}

impl DeliveryClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let provider = &config.provider;
        let client = Client::builder()
            .timeout(provider.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(concat!("sms-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: provider.api_url.clone(),
            auth_header: basic_auth_header(&provider.username, &provider.password)?,
            sender: provider.sender.clone(),
            default_subject: provider.default_subject.clone(),
            timeout: provider.timeout,
            validator: Validator::from_config(&config.validation),
            retry: RetryPolicy::new(&config.retry),
        })
    }

    /// Send a message and return the normalized outcome. Never fails.
    pub async fn send(&self, recipient: &str, message: &str, subject: Option<&str>) -> DeliveryOutcome {
        DeliveryOutcome::from(self.deliver(recipient, message, subject).await)
    }

    /// Send a message, returning the provider's parsed body or a typed error.
    pub async fn deliver(
        &self,
        recipient: &str,
        message: &str,
        subject: Option<&str>,
    ) -> Result<Value> {
        if let Err(reason) = self.validator.check(recipient, message) {
            debug!(recipient = %recipient, reason = %reason, "Rejected before send");
            return Err(reason.into());
        }

        let payload = SendPayload {
            to: [recipient],
            from: &self.sender,
            subject: subject.unwrap_or(&self.default_subject),
            message,
            priority: "high",
        };

        let payload = &payload;
        let result = with_retry(&self.retry, "provider_send", move || self.post(payload)).await;

        if let Err(e) = &result {
            warn!(recipient = %recipient, error = %e, "Delivery failed");
        }
        result
    }

    /// One POST attempt
    async fn post(&self, payload: &SendPayload<'_>) -> Result<Value> {
        let mut request = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, self.auth_header.clone())
            .json(payload);

        if let Some(id) = correlation::current() {
            request = request.header(CORRELATION_HEADER, id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_send(&e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Value>().await.map_err(|e| {
                if e.is_timeout() {
                    Error::ProviderTimeout(self.timeout)
                } else {
                    Error::InvalidResponse(e.to_string())
                }
            });
        }

        let body = response.json::<Value>().await.ok();
        debug!(status = status.as_u16(), "Provider returned error status");
        Err(Error::ProviderStatus {
            status: status.as_u16(),
            body,
        })
    }
}

/// `Basic base64(username:password)`, marked sensitive so it is never logged
fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| Error::Config(format!("Invalid provider credentials: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_encodes_credentials() {
        let value = basic_auth_header("user", "pass").unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic dXNlcjpwYXNz");
        assert!(value.is_sensitive());
    }

    #[test]
    fn payload_matches_provider_contract() {
        let payload = SendPayload {
            to: ["+46701234567"],
            from: "TrafikInfo",
            subject: "Test",
            message: "Hello",
            priority: "high",
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "to": ["+46701234567"],
                "from": "TrafikInfo",
                "subject": "Test",
                "message": "Hello",
                "priority": "high"
            })
        );
    }
}
