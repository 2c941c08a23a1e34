//! Sliding-window rate limiting
//!
//! One shared window guards the single provider account: every caller
//! contends for the same budget. The window is a log of admission instants;
//! entries that have aged out are pruned lazily on each check.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::config::RateLimitConfig;

/// Source of "now" for the limiter
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic window tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Start at the current instant
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Global sliding-window admission gate
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    /// Admission instants, oldest first
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter on the wall clock
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter driven by `clock`
    #[must_use]
    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit: config.limit,
            window: config.window,
            clock,
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    /// Decide whether one more request may proceed, recording it if so.
    ///
    /// Prune, count, and append happen under a single lock so concurrent
    /// callers can never push the window past `limit`.
    pub fn admit(&self) -> bool {
        let mut admitted = self.admitted.lock();
        let now = self.clock.now();
        Self::prune(&mut admitted, now, self.window);

        if admitted.len() >= self.limit {
            trace!(in_window = admitted.len(), limit = self.limit, "Rejecting request");
            return false;
        }

        admitted.push_back(now);
        true
    }

    /// Number of admissions currently inside the window
    pub fn in_window(&self) -> usize {
        let mut admitted = self.admitted.lock();
        Self::prune(&mut admitted, self.clock.now(), self.window);
        admitted.len()
    }

    /// Configured limit
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Configured window length
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn prune(admitted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = admitted.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            admitted.pop_front();
        }
    }
}
