use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tracing::debug;

use filestream_core::{ByteRange, FileMetadata, MessageId, RemoteFileId};
use filestream_worker::{ByteStream, Worker, WorkerError};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A worker session over a [`MemoryContentStore`](crate::MemoryContentStore).
///
/// Besides serving development setups, it exposes a few knobs for exercising
/// failure paths: a per-call latency, a budget after which metadata lookups
/// fail, and a chunk count after which byte streams break off.
pub struct MemoryWorker {
    store: Arc<crate::MemoryContentStore>,
    chunk_size: usize,
    latency: Option<Duration>,
    metadata_budget: Option<u64>,
    break_after_chunks: Option<usize>,
    metadata_calls: AtomicU64,
    byte_calls: AtomicU64,
}

impl MemoryWorker {
    /// Create a worker over `store` with default settings.
    pub fn new(store: Arc<crate::MemoryContentStore>) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
            latency: None,
            metadata_budget: None,
            break_after_chunks: None,
            metadata_calls: AtomicU64::new(0),
            byte_calls: AtomicU64::new(0),
        }
    }

    /// Split streamed bodies into chunks of at most `chunk_size` bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sleep for `latency` before answering any call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every metadata lookup after the first `budget` calls.
    #[must_use]
    pub fn with_metadata_budget(mut self, budget: u64) -> Self {
        self.metadata_budget = Some(budget);
        self
    }

    /// End every byte stream with an error after `chunks` chunks.
    #[must_use]
    pub fn with_broken_streams(mut self, chunks: usize) -> Self {
        self.break_after_chunks = Some(chunks);
        self
    }

    /// Number of metadata lookups served so far (including failed ones).
    pub fn metadata_calls(&self) -> u64 {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    /// Number of byte streams requested so far.
    pub fn byte_calls(&self) -> u64 {
        self.byte_calls.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Worker for MemoryWorker {
    async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError> {
        let call = self.metadata_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        if self.metadata_budget.is_some_and(|budget| call >= budget) {
            return Err(WorkerError::Connection("metadata budget exhausted".into()));
        }
        self.store
            .metadata(message_id)
            .ok_or_else(|| WorkerError::NotFound(format!("message {message_id}")))
    }

    async fn fetch_bytes(
        &self,
        remote_file_id: &RemoteFileId,
        range: ByteRange,
    ) -> Result<ByteStream, WorkerError> {
        self.byte_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        let data = self
            .store
            .object(remote_file_id)
            .ok_or_else(|| WorkerError::NotFound(format!("file {remote_file_id}")))?;

        let len = data.len() as u64;
        if range.end >= len {
            return Err(WorkerError::InvalidResponse(format!(
                "range {}-{} exceeds object size {len}",
                range.start, range.end
            )));
        }
        let start = usize::try_from(range.start)
            .map_err(|_| WorkerError::InvalidResponse("range start overflows".into()))?;
        let end = usize::try_from(range.end)
            .map_err(|_| WorkerError::InvalidResponse("range end overflows".into()))?;
        debug!(remote_file_id = %remote_file_id, start, end, "serving memory object");

        let body = data.slice(start..=end);
        let chunk_size = self.chunk_size;
        let chunks: Vec<Result<bytes::Bytes, WorkerError>> = (0..body.len())
            .step_by(chunk_size)
            .map(|offset| Ok(body.slice(offset..(offset + chunk_size).min(body.len()))))
            .collect();

        match self.break_after_chunks {
            Some(limit) => {
                let head = chunks.into_iter().take(limit);
                let tail = std::iter::once(Err(WorkerError::Connection(
                    "stream interrupted".into(),
                )));
                Ok(futures::stream::iter(head.chain(tail)).boxed())
            }
            None => Ok(futures::stream::iter(chunks).boxed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::MemoryContentStore;

    fn store_with_file() -> Arc<MemoryContentStore> {
        let store = Arc::new(MemoryContentStore::new());
        store.put_file(
            MessageId::new(7),
            "clip.mp4",
            "video/mp4",
            "abc123",
            Bytes::from_static(b"0123456789"),
        );
        store
    }

    async fn collect(stream: ByteStream) -> (Vec<u8>, Option<WorkerError>) {
        let mut out = Vec::new();
        let mut stream = stream;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(e) => return (out, Some(e)),
            }
        }
        (out, None)
    }

    #[tokio::test]
    async fn resolves_metadata() {
        let worker = MemoryWorker::new(store_with_file());
        let meta = worker.fetch_metadata(MessageId::new(7)).await.unwrap();
        assert_eq!(meta.file_size, 10);
        assert_eq!(worker.metadata_calls(), 1);

        let err = worker.fetch_metadata(MessageId::new(8)).await.unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn streams_requested_range_in_chunks() {
        let worker = MemoryWorker::new(store_with_file()).with_chunk_size(3);
        let stream = worker
            .fetch_bytes(&RemoteFileId::from("abc123"), ByteRange { start: 2, end: 8 })
            .await
            .unwrap();
        let (body, err) = collect(stream).await;
        assert_eq!(body, b"2345678");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn rejects_out_of_bounds_range() {
        let worker = MemoryWorker::new(store_with_file());
        let result = worker
            .fetch_bytes(&RemoteFileId::from("abc123"), ByteRange { start: 0, end: 10 })
            .await;
        assert!(matches!(result, Err(WorkerError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let worker = MemoryWorker::new(store_with_file());
        let result = worker
            .fetch_bytes(&RemoteFileId::from("nope"), ByteRange { start: 0, end: 0 })
            .await;
        assert!(matches!(result, Err(WorkerError::NotFound(_))));
    }

    #[tokio::test]
    async fn metadata_budget_fails_later_calls() {
        let worker = MemoryWorker::new(store_with_file()).with_metadata_budget(1);
        worker.fetch_metadata(MessageId::new(7)).await.unwrap();
        let err = worker.fetch_metadata(MessageId::new(7)).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn broken_stream_ends_with_error() {
        let worker = MemoryWorker::new(store_with_file())
            .with_chunk_size(4)
            .with_broken_streams(1);
        let stream = worker
            .fetch_bytes(&RemoteFileId::from("abc123"), ByteRange { start: 0, end: 9 })
            .await
            .unwrap();
        let (body, err) = collect(stream).await;
        assert_eq!(body, b"0123");
        assert!(matches!(err, Some(WorkerError::Connection(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_answers() {
        let worker = MemoryWorker::new(store_with_file()).with_latency(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        worker.fetch_metadata(MessageId::new(7)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
