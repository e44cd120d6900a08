use thiserror::Error;

/// Errors raised while building core values from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The message identifier is not a decimal integer.
    #[error("invalid message id: {0}")]
    InvalidMessageId(String),

    /// The requested hash length is outside the supported window.
    #[error("hash length {length} out of range ({min}..={max})")]
    InvalidHashLength {
        /// Requested length.
        length: usize,
        /// Smallest accepted length.
        min: usize,
        /// Largest accepted length.
        max: usize,
    },
}
