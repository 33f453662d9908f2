//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};
use sync_types::SyncOutcome;

use crate::coordinator::DispatchResult;

/// Counters for dispatched requests and how they resolved.
///
/// Thread-safe via `AtomicU64`; shared by all lanes.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Requests accepted by `dispatch`.
    pub dispatched_total: AtomicU64,
    /// Requests resolved `Sent`.
    pub sent_total: AtomicU64,
    /// Requests resolved `SkippedDebounced`.
    pub skipped_debounced_total: AtomicU64,
    /// Requests resolved `SkippedRedundant`.
    pub skipped_redundant_total: AtomicU64,
    /// Requests resolved with an error.
    pub failed_total: AtomicU64,
}

/// Point-in-time copy of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests accepted by `dispatch`.
    pub dispatched: u64,
    /// Requests resolved `Sent`.
    pub sent: u64,
    /// Requests resolved `SkippedDebounced`.
    pub skipped_debounced: u64,
    /// Requests resolved `SkippedRedundant`.
    pub skipped_redundant: u64,
    /// Requests resolved with an error.
    pub failed: u64,
}

impl MetricsSnapshot {
    /// Requests that have resolved, one way or another.
    pub fn resolved(&self) -> u64 {
        self.sent + self.skipped_debounced + self.skipped_redundant + self.failed
    }
}

impl DispatchMetrics {
    pub(crate) fn record_dispatched(&self) {
        self.dispatched_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, result: &DispatchResult) {
        let counter = match result {
            Ok(SyncOutcome::Sent { .. }) => &self.sent_total,
            Ok(SyncOutcome::SkippedDebounced) => &self.skipped_debounced_total,
            Ok(SyncOutcome::SkippedRedundant) => &self.skipped_redundant_total,
            Err(_) => &self.failed_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched_total.load(Ordering::Relaxed),
            sent: self.sent_total.load(Ordering::Relaxed),
            skipped_debounced: self.skipped_debounced_total.load(Ordering::Relaxed),
            skipped_redundant: self.skipped_redundant_total.load(Ordering::Relaxed),
            failed: self.failed_total.load(Ordering::Relaxed),
        }
    }
}
