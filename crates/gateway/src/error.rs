use std::sync::Arc;

use filestream_worker::WorkerError;
use thiserror::Error;

/// Errors that can occur while generating links or opening streams.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Metadata for the message could not be resolved.
    ///
    /// Shared because concurrent lookups for one id receive the same error.
    #[error("{0}")]
    Resolution(Arc<WorkerError>),

    /// The backing store refused to open the byte stream.
    #[error("fetch failed: {0}")]
    Fetch(WorkerError),

    /// The supplied link hash does not match the file's current metadata.
    #[error("invalid link hash")]
    HashMismatch,

    /// The requested range lies outside the file.
    #[error("range not satisfiable for file of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    /// The gateway was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// The underlying worker error, if this failure came from the backing store.
    pub fn worker_error(&self) -> Option<&WorkerError> {
        match self {
            Self::Resolution(e) => Some(e.as_ref()),
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }
}
