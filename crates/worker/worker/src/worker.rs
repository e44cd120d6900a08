use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

use filestream_core::{ByteRange, FileMetadata, MessageId, RemoteFileId};

use crate::error::WorkerError;

/// A stream of file chunks relayed from the backing store.
///
/// An `Err` item means the transfer broke off mid-way; consumers stop there.
pub type ByteStream = BoxStream<'static, Result<Bytes, WorkerError>>;

/// The account or session a worker operates as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerIdentity {
    /// Human-readable session name (bot username, account handle, ...).
    pub name: String,
}

impl WorkerIdentity {
    /// Create an identity with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Strongly-typed worker trait with native `async fn`.
///
/// A worker is an authenticated session against the backing store. This
/// trait is **not** object-safe; the pool stores workers as
/// [`DynWorker`], which every `Worker` implements through a blanket impl.
pub trait Worker: Send + Sync {
    /// Resolve the file attached to `message_id`.
    fn fetch_metadata(
        &self,
        message_id: MessageId,
    ) -> impl std::future::Future<Output = Result<FileMetadata, WorkerError>> + Send;

    /// Open a byte stream over `range` of the object `remote_file_id`.
    ///
    /// Returning `Ok` means the backing store accepted the request; no
    /// bytes have been handed to the caller yet.
    fn fetch_bytes(
        &self,
        remote_file_id: &RemoteFileId,
        range: ByteRange,
    ) -> impl std::future::Future<Output = Result<ByteStream, WorkerError>> + Send;
}

/// Object-safe worker trait for use behind `Arc<dyn DynWorker>`.
///
/// You generally should not implement this trait directly -- implement
/// [`Worker`] and rely on the blanket implementation.
#[async_trait]
pub trait DynWorker: Send + Sync {
    /// Resolve the file attached to `message_id`.
    async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError>;

    /// Open a byte stream over `range` of the object `remote_file_id`.
    async fn fetch_bytes(
        &self,
        remote_file_id: &RemoteFileId,
        range: ByteRange,
    ) -> Result<ByteStream, WorkerError>;
}

#[async_trait]
impl<T: Worker + Sync> DynWorker for T {
    async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError> {
        Worker::fetch_metadata(self, message_id).await
    }

    async fn fetch_bytes(
        &self,
        remote_file_id: &RemoteFileId,
        range: ByteRange,
    ) -> Result<ByteStream, WorkerError> {
        Worker::fetch_bytes(self, remote_file_id, range).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;

    use super::*;

    struct FixedWorker;

    impl Worker for FixedWorker {
        async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError> {
            if message_id.get() < 0 {
                return Err(WorkerError::NotFound(format!("message {message_id}")));
            }
            Ok(FileMetadata {
                message_id,
                file_name: "f.txt".into(),
                file_size: 5,
                mime_type: "text/plain".into(),
                remote_file_id: RemoteFileId::from("r"),
            })
        }

        async fn fetch_bytes(
            &self,
            _remote_file_id: &RemoteFileId,
            range: ByteRange,
        ) -> Result<ByteStream, WorkerError> {
            let data = Bytes::from_static(b"hello");
            #[allow(clippy::cast_possible_truncation)]
            let chunk = data.slice(range.start as usize..=range.end as usize);
            Ok(futures::stream::once(async move { Ok(chunk) }).boxed())
        }
    }

    #[tokio::test]
    async fn blanket_dyn_worker_impl() {
        let worker: Arc<dyn DynWorker> = Arc::new(FixedWorker);
        let meta = worker.fetch_metadata(MessageId::new(3)).await.unwrap();
        assert_eq!(meta.file_size, 5);

        let mut stream = worker
            .fetch_bytes(&meta.remote_file_id, ByteRange { start: 1, end: 3 })
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "ell");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dyn_worker_propagates_errors() {
        let worker: Arc<dyn DynWorker> = Arc::new(FixedWorker);
        let err = worker.fetch_metadata(MessageId::new(-1)).await.unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }

    #[test]
    fn identity_display() {
        assert_eq!(WorkerIdentity::new("bot-1").to_string(), "bot-1");
    }
}
