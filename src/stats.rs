//! Delivery statistics for the gateway
//!
//! Lock-free counters of terminal request states, reported on `/health`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Terminal state of one handled request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Shared budget exhausted; delivery not attempted
    RateLimited,
    /// Recipient or message failed validation
    Rejected,
    /// Provider accepted the message
    Delivered,
    /// Provider call failed after retries, or failed terminally
    DeliveryFailed,
}

/// Usage statistics for the gateway
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    delivery_failed: AtomicU64,
    rejected: AtomicU64,
    rate_limited: AtomicU64,
}

impl DeliveryStats {
    /// Create new statistics tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one terminal state
    pub fn record(&self, state: RequestState) {
        let counter = match state {
            RequestState::Delivered => &self.delivered,
            RequestState::DeliveryFailed => &self.delivery_failed,
            RequestState::Rejected => &self.rejected,
            RequestState::RateLimited => &self.rate_limited,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current statistics
    pub fn snapshot(&self) -> StatsSnapshot {
        let delivered = self.delivered.load(Ordering::Relaxed);
        let delivery_failed = self.delivery_failed.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);
        let rate_limited = self.rate_limited.load(Ordering::Relaxed);

        StatsSnapshot {
            delivered,
            delivery_failed,
            rejected,
            rate_limited,
            total: delivered + delivery_failed + rejected + rate_limited,
        }
    }
}

/// Snapshot of delivery statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Messages accepted by the provider
    pub delivered: u64,
    /// Provider failures
    pub delivery_failed: u64,
    /// Validation rejections
    pub rejected: u64,
    /// Admission rejections
    pub rate_limited: u64,
    /// All handled requests
    pub total: u64,
}
