//! Sweep metrics.
//!
//! Thread-safe counters for monitoring sweep passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Thread-safe counters accumulated across sweep passes.
#[derive(Debug, Clone, Default)]
pub struct SweepMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Objects seen by the listing.
    objects_scanned: AtomicUsize,
    /// Objects deleted (or simulated in dry-run).
    objects_deleted: AtomicUsize,
    /// Objects copied to the archive target.
    objects_archived: AtomicUsize,
    /// Objects that failed to archive or delete.
    objects_failed: AtomicUsize,
    /// Bytes freed by deletion.
    bytes_reclaimed: AtomicU64,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scanned(&self, count: usize) {
        self.inner.objects_scanned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_deleted(&self, count: usize) {
        self.inner.objects_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_archived(&self, count: usize) {
        self.inner.objects_archived.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failed(&self, count: usize) {
        self.inner.objects_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_bytes_reclaimed(&self, bytes: u64) {
        self.inner.bytes_reclaimed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            objects_scanned: self.inner.objects_scanned.load(Ordering::Relaxed),
            objects_deleted: self.inner.objects_deleted.load(Ordering::Relaxed),
            objects_archived: self.inner.objects_archived.load(Ordering::Relaxed),
            objects_failed: self.inner.objects_failed.load(Ordering::Relaxed),
            bytes_reclaimed: self.inner.bytes_reclaimed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`SweepMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    pub objects_scanned: usize,
    pub objects_deleted: usize,
    pub objects_archived: usize,
    pub objects_failed: usize,
    pub bytes_reclaimed: u64,
}

impl MetricsSummary {
    /// Log the snapshot.
    pub fn log(&self) {
        tracing::info!(
            objects_scanned = self.objects_scanned,
            objects_deleted = self.objects_deleted,
            objects_archived = self.objects_archived,
            objects_failed = self.objects_failed,
            bytes_reclaimed = self.bytes_reclaimed,
            "Sweep metrics summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = SweepMetrics::new();
        metrics.record_scanned(10);
        metrics.record_deleted(4);
        metrics.record_archived(2);
        metrics.record_failed(1);
        metrics.record_bytes_reclaimed(2048);

        let summary = metrics.summary();
        assert_eq!(summary.objects_scanned, 10);
        assert_eq!(summary.objects_deleted, 4);
        assert_eq!(summary.objects_archived, 2);
        assert_eq!(summary.objects_failed, 1);
        assert_eq!(summary.bytes_reclaimed, 2048);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SweepMetrics::new();
        let clone = metrics.clone();
        clone.record_deleted(3);
        assert_eq!(metrics.summary().objects_deleted, 3);
    }
}
