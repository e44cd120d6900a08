use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of a message in the backing store.
///
/// Stable for the lifetime of the message and never reused for a different
/// file while it is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = i64))]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Wrap a raw message identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Return the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for MessageId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| CoreError::InvalidMessageId(s.to_owned()))
    }
}

/// Opaque identifier of the binary object a message points at.
///
/// Distinct from [`MessageId`]: the backing store addresses file contents
/// by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String))]
#[serde(transparent)]
pub struct RemoteFileId(String);

impl RemoteFileId {
    /// Create a new instance from a string value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the inner string as a str slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteFileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteFileId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for RemoteFileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_parses_decimal() {
        assert_eq!("42".parse::<MessageId>().unwrap(), MessageId::new(42));
        assert_eq!("-7".parse::<MessageId>().unwrap(), MessageId::new(-7));
    }

    #[test]
    fn message_id_rejects_garbage() {
        for input in ["abc", "", "4 2", "1.5", "0x10", "42.mp4"] {
            let err = input.parse::<MessageId>().unwrap_err();
            assert_eq!(err, CoreError::InvalidMessageId(input.to_owned()));
        }
    }

    #[test]
    fn message_id_serializes_as_number() {
        let json = serde_json::to_string(&MessageId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 9);
    }

    #[test]
    fn remote_file_id_is_transparent() {
        let id = RemoteFileId::from("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }
}
