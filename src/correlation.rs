//! Correlation ID generation and task-local propagation.
//!
//! A correlation ID is a UUID v4 string prefixed with `"sms-"`. One is minted
//! per handled request and:
//!
//! - Returned to the caller as `"request_id"`.
//! - Forwarded to the provider as the `X-Correlation-Id` header.
//! - Recorded on the request's `tracing` span.
//!
//! The current ID lives in [`CORRELATION_ID`], a `tokio::task_local!` slot.
//! Use [`scope`] to run a future under an ID and [`current`] to read it.

use uuid::Uuid;

/// Header carrying the correlation ID on outbound provider calls
pub const CORRELATION_HEADER: &str = "x-correlation-id";

tokio::task_local! {
    /// Task-local storage for the current correlation ID.
    pub static CORRELATION_ID: String;
}

/// Generate a new correlation ID: `"sms-<uuid-v4>"`.
#[must_use]
pub fn generate() -> String {
    format!("sms-{}", Uuid::new_v4())
}

/// Return the correlation ID set for the current task, if any.
#[must_use]
pub fn current() -> Option<String> {
    CORRELATION_ID.try_with(Clone::clone).ok()
}

/// Run `future` with `id` installed as the task-local correlation ID.
pub async fn scope<F, T>(id: String, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CORRELATION_ID.scope(id, future).await
}
