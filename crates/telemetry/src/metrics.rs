//! Internal metrics collection.
//!
//! Process-wide counters for lookups, dedup hits and store writes.
//! A snapshot is logged when the pipeline finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement, stopping at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the enrichment engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Lookup metrics
    pub lookups_issued: Counter,
    pub lookups_succeeded: Counter,
    pub lookups_empty: Counter,
    pub lookups_failed: Counter,
    pub lookups_timed_out: Counter,

    // Dedup metrics
    pub cache_hits: Counter,
    pub store_hits: Counter,
    pub cache_stale: Counter,
    pub cache_errors: Counter,

    // Persistence metrics
    pub records_stored: Counter,
    pub store_errors: Counter,

    // Latency histograms
    pub lookup_latency_ms: Histogram,
    pub store_latency_ms: Histogram,

    // Gauges
    pub queue_depth: Gauge,
    pub workers_busy: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub lookups_issued: u64,
    pub lookups_succeeded: u64,
    pub lookups_empty: u64,
    pub lookups_failed: u64,
    pub lookups_timed_out: u64,
    pub cache_hits: u64,
    pub store_hits: u64,
    pub cache_stale: u64,
    pub cache_errors: u64,
    pub records_stored: u64,
    pub store_errors: u64,
    pub lookup_latency_mean_ms: f64,
    pub store_latency_mean_ms: f64,
    pub queue_depth: u64,
    pub workers_busy: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            lookups_issued: self.lookups_issued.get(),
            lookups_succeeded: self.lookups_succeeded.get(),
            lookups_empty: self.lookups_empty.get(),
            lookups_failed: self.lookups_failed.get(),
            lookups_timed_out: self.lookups_timed_out.get(),
            cache_hits: self.cache_hits.get(),
            store_hits: self.store_hits.get(),
            cache_stale: self.cache_stale.get(),
            cache_errors: self.cache_errors.get(),
            records_stored: self.records_stored.get(),
            store_errors: self.store_errors.get(),
            lookup_latency_mean_ms: self.lookup_latency_ms.mean(),
            store_latency_mean_ms: self.store_latency_ms.mean(),
            queue_depth: self.queue_depth.get(),
            workers_busy: self.workers_busy.get(),
        }
    }
}

impl MetricsSnapshot {
    /// Emit the snapshot as one structured log line.
    pub fn log(&self) {
        tracing::info!(
            lookups_issued = self.lookups_issued,
            lookups_succeeded = self.lookups_succeeded,
            lookups_empty = self.lookups_empty,
            lookups_failed = self.lookups_failed,
            lookups_timed_out = self.lookups_timed_out,
            cache_hits = self.cache_hits,
            store_hits = self.store_hits,
            cache_stale = self.cache_stale,
            records_stored = self.records_stored,
            store_errors = self.store_errors,
            lookup_latency_mean_ms = self.lookup_latency_mean_ms,
            "Enrichment metrics"
        );
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
