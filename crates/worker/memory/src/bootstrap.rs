use std::sync::Arc;

use async_trait::async_trait;

use filestream_worker::{SessionBootstrap, StartedWorker, WorkerError, WorkerIdentity};

use crate::store::MemoryContentStore;
use crate::worker::MemoryWorker;

/// Starts `1 + additional` memory workers sharing one [`MemoryContentStore`].
pub struct MemoryBootstrap {
    store: Arc<MemoryContentStore>,
    additional: usize,
    chunk_size: Option<usize>,
}

impl MemoryBootstrap {
    /// Create a bootstrap over `store` with `additional` extra sessions.
    pub fn new(store: Arc<MemoryContentStore>, additional: usize) -> Self {
        Self {
            store,
            additional,
            chunk_size: None,
        }
    }

    /// Chunk size passed to every started worker.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    fn worker(&self, name: String) -> StartedWorker {
        let mut worker = MemoryWorker::new(Arc::clone(&self.store));
        if let Some(chunk_size) = self.chunk_size {
            worker = worker.with_chunk_size(chunk_size);
        }
        StartedWorker {
            worker: Arc::new(worker),
            identity: WorkerIdentity::new(name),
        }
    }
}

#[async_trait]
impl SessionBootstrap for MemoryBootstrap {
    async fn start_primary(&self) -> Result<StartedWorker, WorkerError> {
        Ok(self.worker("memory-primary".to_owned()))
    }

    async fn start_additional(&self) -> Vec<Result<StartedWorker, WorkerError>> {
        (1..=self.additional)
            .map(|i| Ok(self.worker(format!("memory-{i}"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use filestream_core::MessageId;
    use filestream_worker::{DynWorker, start_pool};

    use super::*;

    #[tokio::test]
    async fn builds_pool_with_all_sessions() {
        let store = Arc::new(MemoryContentStore::new());
        store.put_file(MessageId::new(1), "a", "", "o1", "abc");
        let pool = start_pool(&MemoryBootstrap::new(store, 2)).await.unwrap();
        assert_eq!(pool.len(), 3);

        let slot = pool.next().unwrap();
        assert_eq!(slot.identity().name, "memory-1");
        let meta = slot.worker().fetch_metadata(MessageId::new(1)).await.unwrap();
        assert_eq!(meta.file_size, 3);
    }
}
