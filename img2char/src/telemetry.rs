//! Batch telemetry for observability and user feedback.
//!
//! Lock-free atomic counters incremented by the scheduler and the fetcher,
//! with point-in-time snapshots for display:
//!
//! ```text
//! Scheduler / Fetcher ───► PipelineMetrics ───► TelemetrySnapshot ───► CLI
//!                          (atomic counters)    (point-in-time copy)
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shared counters for one batch run.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    items_started: AtomicUsize,
    items_completed: AtomicUsize,
    items_failed: AtomicUsize,
    bytes_fetched: AtomicU64,
}

impl PipelineMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an item entered the pipeline.
    pub fn item_started(&self) {
        self.items_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished item by success flag.
    pub fn record_outcome(&self, succeeded: bool) {
        if succeeded {
            self.items_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.items_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record bytes received by the fetcher.
    pub fn bytes_fetched(&self, bytes: u64) {
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            items_started: self.items_started.load(Ordering::Relaxed),
            items_completed: self.items_completed.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub items_started: usize,
    pub items_completed: usize,
    pub items_failed: usize,
    pub bytes_fetched: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let snapshot = PipelineMetrics::new().snapshot();
        assert_eq!(snapshot.items_started, 0);
        assert_eq!(snapshot.items_completed, 0);
        assert_eq!(snapshot.items_failed, 0);
        assert_eq!(snapshot.bytes_fetched, 0);
    }

    #[test]
    fn test_metrics_accumulate() {
        let metrics = PipelineMetrics::new();
        metrics.item_started();
        metrics.item_started();
        metrics.record_outcome(true);
        metrics.record_outcome(false);
        metrics.bytes_fetched(1024);
        metrics.bytes_fetched(512);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.items_started, 2);
        assert_eq!(snapshot.items_completed, 1);
        assert_eq!(snapshot.items_failed, 1);
        assert_eq!(snapshot.bytes_fetched, 1536);
    }
}
