//! Two-phase worker startup.
//!
//! Sessions are created by a [`SessionBootstrap`] implementation. The primary
//! session must come up or startup fails; additional sessions are best
//! effort. The pool is only marked ready once it holds at least one worker.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::WorkerError;
use crate::pool::WorkerPool;
use crate::worker::{DynWorker, WorkerIdentity};

/// An authenticated session produced by a [`SessionBootstrap`].
pub struct StartedWorker {
    pub worker: Arc<dyn DynWorker>,
    pub identity: WorkerIdentity,
}

/// Creates authenticated worker sessions at process start.
#[async_trait]
pub trait SessionBootstrap: Send + Sync {
    /// Start the primary session. Failure aborts startup.
    async fn start_primary(&self) -> Result<StartedWorker, WorkerError>;

    /// Start all additional sessions. Each entry succeeds or fails on its own.
    async fn start_additional(&self) -> Vec<Result<StartedWorker, WorkerError>>;
}

/// Build a ready worker pool from `bootstrap`.
///
/// Additional workers are registered first, then the primary session is
/// appended as the default worker. Failed additional sessions are logged and
/// skipped.
pub async fn start_pool(bootstrap: &dyn SessionBootstrap) -> Result<WorkerPool, WorkerError> {
    let primary = bootstrap.start_primary().await?;
    info!(identity = %primary.identity, "primary worker started");

    let pool = WorkerPool::new();
    let mut failed = 0usize;
    for (position, started) in bootstrap.start_additional().await.into_iter().enumerate() {
        match started {
            Ok(StartedWorker { worker, identity }) => {
                pool.add_worker(worker, identity);
            }
            Err(e) => {
                failed += 1;
                warn!(position, error = %e, "additional worker failed to start, skipping");
            }
        }
    }

    pool.add_worker(primary.worker, primary.identity);
    pool.mark_ready()?;
    info!(workers = pool.len(), failed, "worker pool started");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use filestream_core::{ByteRange, FileMetadata, MessageId, RemoteFileId};

    use super::*;
    use crate::worker::{ByteStream, Worker};

    struct NullWorker;

    impl Worker for NullWorker {
        async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError> {
            Err(WorkerError::NotFound(message_id.to_string()))
        }

        async fn fetch_bytes(
            &self,
            remote_file_id: &RemoteFileId,
            _range: ByteRange,
        ) -> Result<ByteStream, WorkerError> {
            Err(WorkerError::NotFound(remote_file_id.to_string()))
        }
    }

    fn started(name: &str) -> StartedWorker {
        StartedWorker {
            worker: Arc::new(NullWorker),
            identity: WorkerIdentity::new(name),
        }
    }

    struct ScriptedBootstrap {
        primary_ok: bool,
        additional: Vec<bool>,
    }

    #[async_trait]
    impl SessionBootstrap for ScriptedBootstrap {
        async fn start_primary(&self) -> Result<StartedWorker, WorkerError> {
            if self.primary_ok {
                Ok(started("primary"))
            } else {
                Err(WorkerError::AccessDenied("bad token".into()))
            }
        }

        async fn start_additional(&self) -> Vec<Result<StartedWorker, WorkerError>> {
            self.additional
                .iter()
                .enumerate()
                .map(|(i, ok)| {
                    if *ok {
                        Ok(started(&format!("extra-{i}")))
                    } else {
                        Err(WorkerError::Connection("refused".into()))
                    }
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn primary_is_registered_last_as_default() {
        let bootstrap = ScriptedBootstrap {
            primary_ok: true,
            additional: vec![true, true],
        };
        let pool = start_pool(&bootstrap).await.unwrap();
        assert!(pool.is_ready());
        let names: Vec<String> = pool
            .snapshot()
            .workers
            .into_iter()
            .map(|w| w.identity.name)
            .collect();
        assert_eq!(names, vec!["extra-0", "extra-1", "primary"]);
    }

    #[tokio::test]
    async fn failed_additional_workers_are_skipped() {
        let bootstrap = ScriptedBootstrap {
            primary_ok: true,
            additional: vec![false, true, false],
        };
        let pool = start_pool(&bootstrap).await.unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.is_ready());
    }

    #[tokio::test]
    async fn primary_only_is_enough() {
        let bootstrap = ScriptedBootstrap {
            primary_ok: true,
            additional: vec![false],
        };
        let pool = start_pool(&bootstrap).await.unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.next().unwrap().identity().name, "primary");
    }

    #[tokio::test]
    async fn primary_failure_is_fatal() {
        let bootstrap = ScriptedBootstrap {
            primary_ok: false,
            additional: vec![true],
        };
        let err = start_pool(&bootstrap).await.unwrap_err();
        assert!(matches!(err, WorkerError::AccessDenied(_)));
    }
}
