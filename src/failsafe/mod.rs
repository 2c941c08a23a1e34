//! Failsafe mechanisms guarding the provider: shared rate limiting and retries

mod rate_limiter;
mod retry;

pub use rate_limiter::{Clock, ManualClock, SlidingWindowLimiter, SystemClock};
pub use retry::{RetryPolicy, with_retry};
