//! Retry logic with exponential backoff

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use tokio::time::sleep;
use tracing::debug;

use crate::Error;
use crate::config::RetryConfig;

/// Retry policy for provider calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Provider statuses treated as transient
    pub retry_status_codes: Vec<u16>,
    /// Initial backoff
    pub initial_backoff: Duration,
    /// Maximum backoff
    pub max_backoff: Duration,
    /// Backoff multiplier
    pub multiplier: f32,
}

impl RetryPolicy {
    /// Create from config
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_status_codes: config.retry_status_codes.clone(),
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    /// Total attempts including the first one
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether `error` should be retried under this policy
    #[must_use]
    pub fn is_retryable(&self, error: &Error) -> bool {
        error.is_transient(&self.retry_status_codes)
    }

    /// Create an exponential backoff schedule
    #[must_use]
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_max_delay(self.max_backoff)
            .with_factor(self.multiplier)
            .with_max_times(self.max_retries as usize)
            .build()
    }
}

/// Execute a future with retry logic
///
/// # Errors
///
/// Returns the last error from `f` if all retry attempts are exhausted or
/// the error is not retryable.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, name: &str, mut f: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut backoff = policy.create_backoff();
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !policy.is_retryable(&e) {
                    return Err(e);
                }

                if attempts >= policy.max_attempts() {
                    debug!(
                        operation = name,
                        attempts = attempts,
                        error = %e,
                        "Max retry attempts reached"
                    );
                    return Err(e);
                }

                if let Some(duration) = backoff.next() {
                    debug!(
                        operation = name,
                        attempt = attempts,
                        delay_ms = duration.as_millis(),
                        error = %e,
                        "Retrying after backoff"
                    );
                    sleep(duration).await;
                } else {
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            ..RetryConfig::default()
        })
    }

    fn unavailable() -> Error {
        Error::ProviderStatus {
            status: 503,
            body: None,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result = with_retry(&policy(3), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok("sent")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "sent");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&policy(3), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert!(matches!(result, Err(Error::ProviderStatus { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&policy(3), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::ProviderStatus {
                status: 401,
                body: None,
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&policy(0), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Transport("refused".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_schedule_is_bounded() {
        let delays: Vec<_> = policy(3).create_backoff().collect();
        assert_eq!(delays.len(), 3);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(2)));
    }
}
