pub mod bootstrap;
pub mod store;
pub mod worker;

pub use bootstrap::MemoryBootstrap;
pub use store::MemoryContentStore;
pub use worker::MemoryWorker;
