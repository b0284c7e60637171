use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// In-process counters for `/analyze` traffic.
pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    degraded_requests: AtomicUsize,
    rejected_requests: AtomicUsize,

    // Timing (in microseconds)
    total_analysis_time_us: AtomicU64,
    timed_analyses: AtomicUsize,

    // Counts
    total_documents_analyzed: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            degraded_requests: AtomicUsize::new(0),
            rejected_requests: AtomicUsize::new(0),
            total_analysis_time_us: AtomicU64::new(0),
            timed_analyses: AtomicUsize::new(0),
            total_documents_analyzed: AtomicUsize::new(0),
        })
    }

    /// A blank statement that never reached the provider.
    pub fn record_rejected(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// `has_error` responses count as degraded, whatever caused them.
    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.degraded_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_analysis(&self, duration: Duration, documents: usize) {
        self.total_analysis_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.timed_analyses.fetch_add(1, Ordering::Relaxed);
        self.total_documents_analyzed
            .fetch_add(documents, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            degraded_requests: self.degraded_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            avg_analysis_time_ms: self.avg_time_ms(),
            total_documents_analyzed: self.total_documents_analyzed.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self) -> f64 {
        let total = self.total_analysis_time_us.load(Ordering::Relaxed) as f64;
        let cnt = self.timed_analyses.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub degraded_requests: usize,
    pub rejected_requests: usize,
    pub avg_analysis_time_ms: f64,
    pub total_documents_analyzed: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
