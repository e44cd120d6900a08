pub mod bootstrap;
pub mod error;
pub mod pool;
pub mod worker;

pub use bootstrap::{SessionBootstrap, StartedWorker, start_pool};
pub use error::WorkerError;
pub use pool::{PoolSnapshot, SlotSnapshot, WorkerPool, WorkerSlot};
pub use worker::{ByteStream, DynWorker, Worker, WorkerIdentity};
