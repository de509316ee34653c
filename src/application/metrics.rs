//! Observability counters for the dispatcher.
//!
//! Admission outcomes and delivery results are only ever reported through
//! logs and these counters; none of them reach the producer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters tracking admissions and deliveries.
///
/// All counters use relaxed atomics. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    admitted: AtomicU64,
    blocked_by_global: AtomicU64,
    blocked_by_domain: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    windows_pruned: AtomicU64,
}

impl DispatchMetrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blocked_by_global(&self) {
        self.inner.blocked_by_global.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blocked_by_domain(&self) {
        self.inner.blocked_by_domain.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.inner.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pruned(&self, count: usize) {
        self.inner
            .windows_pruned
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Notifications admitted by both tiers.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Checks denied by the global tier.
    pub fn blocked_by_global(&self) -> u64 {
        self.inner.blocked_by_global.load(Ordering::Relaxed)
    }

    /// Checks denied by the per-domain tier.
    pub fn blocked_by_domain(&self) -> u64 {
        self.inner.blocked_by_domain.load(Ordering::Relaxed)
    }

    /// Notifications accepted by the sink.
    pub fn sent(&self) -> u64 {
        self.inner.sent.load(Ordering::Relaxed)
    }

    /// Transmissions that failed.
    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }

    /// Transmissions abandoned because of cancellation or shutdown.
    pub fn cancelled(&self) -> u64 {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    /// Domain windows removed by cleanup.
    pub fn windows_pruned(&self) -> u64 {
        self.inner.windows_pruned.load(Ordering::Relaxed)
    }

    /// Transmissions that have finished one way or another.
    pub fn completed(&self) -> u64 {
        self.sent() + self.failed() + self.cancelled()
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            blocked_by_global: self.blocked_by_global(),
            blocked_by_domain: self.blocked_by_domain(),
            sent: self.sent(),
            failed: self.failed(),
            cancelled: self.cancelled(),
            windows_pruned: self.windows_pruned(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Checks that passed both gates
    pub admitted: u64,
    /// Checks denied by the global gate
    pub blocked_by_global: u64,
    /// Checks denied by the per-domain gate
    pub blocked_by_domain: u64,
    /// Notifications the sink accepted
    pub sent: u64,
    /// Sends that failed or timed out
    pub failed: u64,
    /// Sends abandoned before completing
    pub cancelled: u64,
    /// Domain windows removed by cleanup
    pub windows_pruned: u64,
}

impl MetricsSnapshot {
    /// Total admission checks performed.
    pub fn checks(&self) -> u64 {
        self.admitted
            .saturating_add(self.blocked_by_global)
            .saturating_add(self.blocked_by_domain)
    }

    /// Share of admission checks that were denied (0.0 to 1.0).
    ///
    /// Returns 0.0 if no check has been made.
    pub fn block_rate(&self) -> f64 {
        let checks = self.checks();
        if checks == 0 {
            0.0
        } else {
            (self.blocked_by_global + self.blocked_by_domain) as f64 / checks as f64
        }
    }
}
