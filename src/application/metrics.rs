//! Observability metrics for admission decisions.
//!
//! Provides counters about engine behavior for monitoring and debugging.

use crate::domain::decision::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Decisions that allowed a throttled action
    allowed: AtomicU64,
    /// Decisions for actions with no policy
    unthrottled: AtomicU64,
    /// Decisions that asked for identity verification
    verification_required: AtomicU64,
    /// Decisions that rejected the action outright
    exceeded: AtomicU64,
    /// Counter store failures surfaced to callers
    store_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a decision outcome for a throttled action.
    pub(crate) fn record_outcome(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Allowed => &self.inner.allowed,
            Outcome::RequiresVerification => &self.inner.verification_required,
            Outcome::Exceeded => &self.inner.exceeded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decision for an action with no policy.
    pub(crate) fn record_unthrottled(&self) {
        self.inner.unthrottled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a counter store failure.
    pub(crate) fn record_store_failure(&self) {
        self.inner.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Throttled actions that were allowed.
    pub fn allowed(&self) -> u64 {
        self.inner.allowed.load(Ordering::Relaxed)
    }

    /// Actions allowed because they have no policy.
    pub fn unthrottled(&self) -> u64 {
        self.inner.unthrottled.load(Ordering::Relaxed)
    }

    /// Decisions that required identity verification.
    pub fn verification_required(&self) -> u64 {
        self.inner.verification_required.load(Ordering::Relaxed)
    }

    /// Decisions that exceeded the ceiling.
    pub fn exceeded(&self) -> u64 {
        self.inner.exceeded.load(Ordering::Relaxed)
    }

    /// Counter store failures.
    pub fn store_failures(&self) -> u64 {
        self.inner.store_failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            allowed: self.allowed(),
            unthrottled: self.unthrottled(),
            verification_required: self.verification_required(),
            exceeded: self.exceeded(),
            store_failures: self.store_failures(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.allowed.store(0, Ordering::Relaxed);
        self.inner.unthrottled.store(0, Ordering::Relaxed);
        self.inner.verification_required.store(0, Ordering::Relaxed);
        self.inner.exceeded.store(0, Ordering::Relaxed);
        self.inner.store_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Throttled actions that were allowed
    pub allowed: u64,
    /// Actions allowed because they have no policy
    pub unthrottled: u64,
    /// Decisions that required identity verification
    pub verification_required: u64,
    /// Decisions that exceeded the ceiling
    pub exceeded: u64,
    /// Counter store failures
    pub store_failures: u64,
}

impl MetricsSnapshot {
    /// Total number of decisions produced (store failures excluded).
    pub fn total_decisions(&self) -> u64 {
        self.allowed
            .saturating_add(self.unthrottled)
            .saturating_add(self.verification_required)
            .saturating_add(self.exceeded)
    }

    /// Ratio of denied decisions (verification required or exceeded) to all
    /// decisions, from 0.0 to 1.0. Returns 0.0 if nothing was decided.
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.verification_required.saturating_add(self.exceeded) as f64 / total as f64
        }
    }
}
