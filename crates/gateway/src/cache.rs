use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use filestream_core::{FileMetadata, MessageId};
use filestream_worker::WorkerError;

use crate::metrics::GatewayMetrics;

/// A bounded metadata cache backed by [`moka`].
///
/// Uses `try_get_with` to coalesce concurrent lookups for the same message
/// into a single backing-store call. Failed lookups are never cached, so the
/// next request for that id retries.
pub struct MetadataCache {
    cache: Cache<MessageId, FileMetadata>,
    metrics: Arc<GatewayMetrics>,
}

impl MetadataCache {
    /// Create a cache holding at most `max_capacity` entries, each expiring
    /// `ttl` after insertion when set.
    pub fn new(max_capacity: u64, ttl: Option<Duration>, metrics: Arc<GatewayMetrics>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
            metrics,
        }
    }

    /// Return the cached metadata for `message_id`, running `fetch` on a miss.
    ///
    /// Hit/miss counters are approximate under high concurrency: concurrent
    /// callers for the same uncached id may all count as misses even though
    /// only one of them runs its `fetch`.
    pub async fn resolve<F>(
        &self,
        message_id: MessageId,
        fetch: F,
    ) -> Result<FileMetadata, Arc<WorkerError>>
    where
        F: Future<Output = Result<FileMetadata, WorkerError>>,
    {
        // Racy with try_get_with but good enough for operational counters.
        if let Some(metadata) = self.cache.get(&message_id).await {
            self.metrics.increment_cache_hits();
            return Ok(metadata);
        }

        self.metrics.increment_cache_misses();
        self.cache.try_get_with(message_id, fetch).await
    }

    /// Look up `message_id` without fetching.
    pub async fn get(&self, message_id: MessageId) -> Option<FileMetadata> {
        self.cache.get(&message_id).await
    }

    /// Insert or replace an entry.
    pub async fn insert(&self, metadata: FileMetadata) {
        self.cache.insert(metadata.message_id, metadata).await;
    }

    /// Drop the entry for `message_id` so the next lookup refetches it.
    pub async fn invalidate(&self, message_id: MessageId) {
        self.cache.invalidate(&message_id).await;
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entry_count", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
