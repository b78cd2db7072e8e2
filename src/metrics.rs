use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    documents_processed: AtomicU64,
    documents_succeeded: AtomicU64,
    documents_failed: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that produced a validated summary.
    pub fn record_success(&self) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.documents_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document that ended in a failed result.
    pub fn record_failure(&self) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            documents_succeeded: self.documents_succeeded.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents handled since startup, whatever their outcome.
    pub documents_processed: u64,
    /// Documents that produced a validated summary.
    pub documents_succeeded: u64,
    /// Documents that ended in a failed result.
    pub documents_failed: u64,
}
