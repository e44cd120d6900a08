use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use filestream_core::{ByteRange, FileMetadata, LinkCodec, MessageId, RangeSpec};
use filestream_worker::{ByteStream, DynWorker, WorkerError, WorkerPool, WorkerSlot};

use crate::cache::MetadataCache;
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;

/// A verified stream ready to be relayed to the client.
///
/// Only produced after the backing store accepted the byte request, so
/// callers can commit to a success status before sending any bytes.
pub struct FileStream {
    /// Metadata the link was verified against.
    pub metadata: FileMetadata,
    /// Bytes covered by `body`, or `None` for an empty file.
    pub range: Option<ByteRange>,
    /// Whether the client asked for a range (answer with 206).
    pub partial: bool,
    /// File contents. An `Err` item means the transfer broke off.
    pub body: ByteStream,
}

impl FileStream {
    /// Number of bytes `body` will yield on success.
    pub fn content_length(&self) -> u64 {
        self.range.map_or(0, |range| range.len())
    }
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("metadata", &self.metadata)
            .field("range", &self.range)
            .field("partial", &self.partial)
            .finish_non_exhaustive()
    }
}

/// Mints stream links and serves verified streams.
///
/// Each request picks one worker from the pool and uses it for both the
/// metadata lookup (on a cache miss) and the byte fetch:
/// 1. Take the next worker from the round-robin pool.
/// 2. Resolve metadata through the [`MetadataCache`].
/// 3. Hash (for links) or verify (for streams) via the [`LinkCodec`].
/// 4. For streams, open the byte range on the same worker.
pub struct Gateway {
    pub(crate) pool: Arc<WorkerPool>,
    pub(crate) cache: MetadataCache,
    pub(crate) codec: LinkCodec,
    pub(crate) public_url: String,
    pub(crate) fetch_timeout: Duration,
    pub(crate) metrics: Arc<GatewayMetrics>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("public_url", &self.public_url)
            .field("codec", &self.codec)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build a shareable stream URL for `message_id`.
    #[instrument(skip_all, fields(message_id = %message_id))]
    pub async fn generate_link(&self, message_id: MessageId) -> Result<String, GatewayError> {
        let slot = self.next_worker()?;
        let metadata = self.resolve(&slot, message_id).await?;
        let hash = self.codec.hash(&metadata);
        self.metrics.increment_links_generated();
        info!(worker = %slot.identity(), file_size = metadata.file_size, "link generated");
        Ok(format!(
            "{}/stream/{message_id}.mp4?hash={hash}",
            self.public_url
        ))
    }

    /// Verify `hash` against the current metadata of `message_id` and open
    /// the requested part of the file.
    ///
    /// Nothing is fetched from the backing store unless the hash matches and
    /// the range is satisfiable. An empty file yields an empty body without
    /// any byte request.
    #[instrument(skip_all, fields(message_id = %message_id))]
    pub async fn open_stream(
        &self,
        message_id: MessageId,
        hash: &str,
        range: Option<RangeSpec>,
    ) -> Result<FileStream, GatewayError> {
        let slot = self.next_worker()?;
        let metadata = self.resolve(&slot, message_id).await?;

        if !self.codec.verify(&metadata, hash) {
            self.metrics.increment_hash_mismatches();
            warn!("stream link hash mismatch");
            return Err(GatewayError::HashMismatch);
        }

        let size = metadata.file_size;
        let (byte_range, partial) = match range {
            Some(spec) => {
                let resolved = spec
                    .resolve(size)
                    .map_err(|_| GatewayError::RangeNotSatisfiable { size })?;
                (Some(resolved), true)
            }
            None => (ByteRange::full(size), false),
        };

        let Some(byte_range) = byte_range else {
            debug!("empty file, nothing to fetch");
            return Ok(FileStream {
                metadata,
                range: None,
                partial: false,
                body: futures::stream::empty().boxed(),
            });
        };

        let body = self.fetch_bytes(&slot, &metadata, byte_range).await?;
        self.metrics.increment_streams_opened();
        info!(
            worker = %slot.identity(),
            start = byte_range.start,
            end = byte_range.end,
            size,
            "stream opened"
        );

        let metrics = Arc::clone(&self.metrics);
        let body = body
            .inspect(move |chunk| {
                if let Err(e) = chunk {
                    metrics.increment_stream_failures();
                    warn!(message_id = %message_id, error = %e, "stream broke off mid-transfer");
                }
            })
            .boxed();

        Ok(FileStream {
            metadata,
            range: Some(byte_range),
            partial,
            body,
        })
    }

    /// The worker pool requests are spread over.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// The metadata cache.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// The codec used to hash and verify links.
    pub fn codec(&self) -> &LinkCodec {
        &self.codec
    }

    /// Base URL generated links point at.
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Gateway counters.
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    fn next_worker(&self) -> Result<WorkerSlot, GatewayError> {
        self.pool
            .next()
            .map_err(|e| GatewayError::Resolution(Arc::new(e)))
    }

    async fn resolve(
        &self,
        slot: &WorkerSlot,
        message_id: MessageId,
    ) -> Result<FileMetadata, GatewayError> {
        let worker = Arc::clone(slot.worker());
        let timeout = self.fetch_timeout;
        let fetch = async move {
            tokio::time::timeout(timeout, worker.fetch_metadata(message_id))
                .await
                .unwrap_or(Err(WorkerError::Timeout(timeout)))
        };

        self.cache.resolve(message_id, fetch).await.map_err(|e| {
            self.metrics.increment_resolution_failures();
            warn!(worker = %slot.identity(), error = %e, "metadata resolution failed");
            GatewayError::Resolution(e)
        })
    }

    async fn fetch_bytes(
        &self,
        slot: &WorkerSlot,
        metadata: &FileMetadata,
        range: ByteRange,
    ) -> Result<ByteStream, GatewayError> {
        let opened = tokio::time::timeout(
            self.fetch_timeout,
            slot.worker().fetch_bytes(&metadata.remote_file_id, range),
        )
        .await
        .unwrap_or(Err(WorkerError::Timeout(self.fetch_timeout)));

        opened.map_err(|e| {
            self.metrics.increment_stream_failures();
            warn!(worker = %slot.identity(), error = %e, "backing store refused byte request");
            GatewayError::Fetch(e)
        })
    }
}
