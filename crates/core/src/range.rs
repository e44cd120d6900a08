//! HTTP byte-range handling for relayed files.
//!
//! Only single ranges in the `bytes` unit are honored. Anything else is
//! treated as if no `Range` header had been sent, which RFC 9110 allows.

use thiserror::Error;

/// An inclusive byte range `start..=end` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// The range covering a whole file, or `None` for an empty file.
    pub fn full(size: u64) -> Option<Self> {
        (size > 0).then(|| Self {
            start: 0,
            end: size - 1,
        })
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`: a range covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the `Content-Range` header of a 206 response.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{size}", self.start, self.end)
    }
}

/// A byte range as requested by the client, before the file size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=a-b`
    Bounded { start: u64, end: u64 },
    /// `bytes=a-`
    From { start: u64 },
    /// `bytes=-n`, the last `n` bytes.
    Suffix { length: u64 },
}

/// The requested range lies entirely outside the file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range not satisfiable for size {size}")]
    Unsatisfiable { size: u64 },
}

impl RangeSpec {
    /// Parse a `Range` header value.
    ///
    /// Returns `None` for headers that should be ignored: other units,
    /// multiple ranges, or malformed values.
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?.trim();
        if spec.contains(',') {
            return None;
        }
        let (first, last) = spec.split_once('-')?;
        let (first, last) = (first.trim(), last.trim());

        match (first.is_empty(), last.is_empty()) {
            (true, true) => None,
            (true, false) => Some(Self::Suffix {
                length: last.parse().ok()?,
            }),
            (false, true) => Some(Self::From {
                start: first.parse().ok()?,
            }),
            (false, false) => {
                let start: u64 = first.parse().ok()?;
                let end: u64 = last.parse().ok()?;
                (start <= end).then_some(Self::Bounded { start, end })
            }
        }
    }

    /// Resolve against a file of `size` bytes.
    pub fn resolve(self, size: u64) -> Result<ByteRange, RangeError> {
        let unsatisfiable = RangeError::Unsatisfiable { size };
        if size == 0 {
            return Err(unsatisfiable);
        }
        let last = size - 1;
        match self {
            Self::Bounded { start, end } if start <= last => Ok(ByteRange {
                start,
                end: end.min(last),
            }),
            Self::From { start } if start <= last => Ok(ByteRange { start, end: last }),
            Self::Suffix { length } if length > 0 => Ok(ByteRange {
                start: size.saturating_sub(length),
                end: last,
            }),
            _ => Err(unsatisfiable),
        }
    }
}
