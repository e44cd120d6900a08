use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the backing store through a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The message or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The session may not access the message or file.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The backing store throttled this session.
    #[error("rate limited")]
    RateLimited,

    /// The backing store did not answer within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backing store answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The worker was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// No worker has been registered in the pool.
    #[error("no workers registered")]
    NoWorkers,
}

impl WorkerError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Connection(_) | Self::RateLimited
        )
    }
}
