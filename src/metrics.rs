use std::sync::atomic::{AtomicU64, Ordering};

/// Optional metrics for monitoring ring buffer activity.
///
/// Collected with relaxed atomics when [`Config::enable_metrics`] is set;
/// otherwise every update is skipped, so disabled metrics cost nothing beyond
/// the branch.
///
/// [`Config::enable_metrics`]: crate::Config::enable_metrics
#[derive(Debug, Default)]
pub struct Metrics {
    acquires_granted: AtomicU64,
    acquires_refused: AtomicU64,
    wraps: AtomicU64,
    produces: AtomicU64,
    consumes_empty: AtomicU64,
    consumes_nonempty: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_acquire_granted(&self) {
        self.acquires_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_acquire_refused(&self) {
        self.acquires_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_wrap(&self) {
        self.wraps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_produce(&self) {
        self.produces.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_consume(&self, len: usize) {
        if len == 0 {
            self.consumes_empty.fetch_add(1, Ordering::Relaxed);
        } else {
            self.consumes_nonempty.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Takes a point-in-time snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            acquires_granted: self.acquires_granted.load(Ordering::Relaxed),
            acquires_refused: self.acquires_refused.load(Ordering::Relaxed),
            wraps: self.wraps.load(Ordering::Relaxed),
            produces: self.produces.load(Ordering::Relaxed),
            consumes_empty: self.consumes_empty.load(Ordering::Relaxed),
            consumes_nonempty: self.consumes_nonempty.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub acquires_granted: u64,
    pub acquires_refused: u64,
    pub wraps: u64,
    pub produces: u64,
    pub consumes_empty: u64,
    pub consumes_nonempty: u64,
}
