use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::worker::{DynWorker, WorkerIdentity};

struct Member {
    worker: Arc<dyn DynWorker>,
    identity: WorkerIdentity,
    selected: AtomicU64,
}

/// A worker handed out by [`WorkerPool::next`].
#[derive(Clone)]
pub struct WorkerSlot {
    index: usize,
    member: Arc<Member>,
}

impl WorkerSlot {
    /// Position of this worker in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identity the worker operates as.
    pub fn identity(&self) -> &WorkerIdentity {
        &self.member.identity
    }

    /// The worker session itself.
    pub fn worker(&self) -> &Arc<dyn DynWorker> {
        &self.member.worker
    }
}

impl fmt::Debug for WorkerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerSlot")
            .field("index", &self.index)
            .field("identity", &self.member.identity)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of one pool member.
#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub identity: WorkerIdentity,
    /// How many times [`WorkerPool::next`] returned this member.
    pub selected: u64,
}

/// Point-in-time view of the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub ready: bool,
    pub workers: Vec<SlotSnapshot>,
}

/// Ordered, append-only set of interchangeable worker sessions.
///
/// [`next`](Self::next) hands workers out round-robin so that calls to the
/// backing store spread across every session's rate budget. The cursor is a
/// single atomic counter: reading the current position and advancing it is
/// one `fetch_add`, so concurrent callers each get a distinct cursor value.
/// The member index is the cursor modulo the pool length at call time.
#[derive(Default)]
pub struct WorkerPool {
    members: RwLock<Vec<Arc<Member>>>,
    cursor: AtomicUsize,
    ready: AtomicBool,
}

impl WorkerPool {
    /// Create an empty pool. It must receive at least one worker before
    /// [`mark_ready`](Self::mark_ready) succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worker to the end of the pool and return its index.
    ///
    /// Registering the same session twice is allowed and yields two
    /// independent slots.
    pub fn add_worker(&self, worker: Arc<dyn DynWorker>, identity: WorkerIdentity) -> usize {
        let mut members = self.members.write();
        let index = members.len();
        debug!(index, identity = %identity, "worker registered");
        members.push(Arc::new(Member {
            worker,
            identity,
            selected: AtomicU64::new(0),
        }));
        index
    }

    /// Return the worker under the cursor and advance the cursor by one.
    pub fn next(&self) -> Result<WorkerSlot, WorkerError> {
        let members = self.members.read();
        if members.is_empty() {
            return Err(WorkerError::NoWorkers);
        }
        // Wraps at usize::MAX; the index stays in range either way.
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = cursor % members.len();
        let member = Arc::clone(&members[index]);
        member.selected.fetch_add(1, Ordering::Relaxed);
        Ok(WorkerSlot { index, member })
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether no worker has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Open the pool for traffic. Fails while the pool is empty.
    pub fn mark_ready(&self) -> Result<(), WorkerError> {
        let len = self.len();
        if len == 0 {
            return Err(WorkerError::NoWorkers);
        }
        self.ready.store(true, Ordering::Release);
        info!(workers = len, "worker pool ready");
        Ok(())
    }

    /// Whether the pool has been opened for traffic.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Capture identities and selection counts of all members.
    pub fn snapshot(&self) -> PoolSnapshot {
        let workers = self
            .members
            .read()
            .iter()
            .enumerate()
            .map(|(index, m)| SlotSnapshot {
                index,
                identity: m.identity.clone(),
                selected: m.selected.load(Ordering::Relaxed),
            })
            .collect();
        PoolSnapshot {
            ready: self.is_ready(),
            workers,
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("len", &self.len())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
