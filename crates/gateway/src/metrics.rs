use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking link and stream outcomes.
///
/// All counters use relaxed ordering for maximum throughput. For a
/// consistent point-in-time view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Links handed out by `/generate`.
    pub links_generated: AtomicU64,
    /// Streams whose first bytes were requested from the backing store.
    pub streams_opened: AtomicU64,
    /// Stream requests rejected because the supplied hash did not match.
    pub hash_mismatches: AtomicU64,
    /// Metadata lookups that failed.
    pub resolution_failures: AtomicU64,
    /// Byte streams that failed to open or broke off mid-transfer.
    pub stream_failures: AtomicU64,
    /// Metadata lookups answered from the cache.
    pub cache_hits: AtomicU64,
    /// Metadata lookups that had to go to the backing store.
    pub cache_misses: AtomicU64,
}

impl GatewayMetrics {
    /// Increment the links generated counter.
    pub fn increment_links_generated(&self) {
        self.links_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the streams opened counter.
    pub fn increment_streams_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the hash mismatches counter.
    pub fn increment_hash_mismatches(&self) {
        self.hash_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the resolution failures counter.
    pub fn increment_resolution_failures(&self) {
        self.resolution_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the stream failures counter.
    pub fn increment_stream_failures(&self) {
        self.stream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the cache hits counter.
    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the cache misses counter.
    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            links_generated: self.links_generated.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            hash_mismatches: self.hash_mismatches.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
            stream_failures: self.stream_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`GatewayMetrics`] at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Links handed out by `/generate`.
    pub links_generated: u64,
    /// Streams whose first bytes were requested from the backing store.
    pub streams_opened: u64,
    /// Stream requests rejected because the supplied hash did not match.
    pub hash_mismatches: u64,
    /// Metadata lookups that failed.
    pub resolution_failures: u64,
    /// Byte streams that failed to open or broke off mid-transfer.
    pub stream_failures: u64,
    /// Metadata lookups answered from the cache.
    pub cache_hits: u64,
    /// Metadata lookups that had to go to the backing store.
    pub cache_misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let snap = GatewayMetrics::default().snapshot();
        assert_eq!(snap.links_generated, 0);
        assert_eq!(snap.streams_opened, 0);
        assert_eq!(snap.hash_mismatches, 0);
        assert_eq!(snap.resolution_failures, 0);
        assert_eq!(snap.stream_failures, 0);
        assert_eq!(snap.cache_hits, 0);
        assert_eq!(snap.cache_misses, 0);
    }

    #[test]
    fn increment_and_snapshot() {
        let m = GatewayMetrics::default();
        m.increment_links_generated();
        m.increment_links_generated();
        m.increment_streams_opened();
        m.increment_hash_mismatches();
        m.increment_resolution_failures();
        m.increment_stream_failures();
        m.increment_cache_hits();
        m.increment_cache_misses();

        let snap = m.snapshot();
        assert_eq!(snap.links_generated, 2);
        assert_eq!(snap.streams_opened, 1);
        assert_eq!(snap.hash_mismatches, 1);
        assert_eq!(snap.resolution_failures, 1);
        assert_eq!(snap.stream_failures, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 1);
    }

    #[test]
    fn snapshot_serializes_flat() {
        let m = GatewayMetrics::default();
        m.increment_cache_hits();
        let json = serde_json::to_value(m.snapshot()).unwrap();
        assert_eq!(json["cache_hits"], 1);
        assert_eq!(json["links_generated"], 0);
    }
}
