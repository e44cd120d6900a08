use serde::{Deserialize, Serialize};

use crate::types::{MessageId, RemoteFileId};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Resolved attributes of a stored object.
///
/// Every field except `message_id` feeds the link hash, so any change to
/// them invalidates previously issued links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FileMetadata {
    /// Message the file was resolved from.
    pub message_id: MessageId,
    /// Original file name, possibly empty.
    #[serde(default)]
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type as reported by the backing store, possibly empty.
    #[serde(default)]
    pub mime_type: String,
    /// Identifier of the underlying binary object.
    pub remote_file_id: RemoteFileId,
}

impl FileMetadata {
    /// Content type to advertise when relaying the file.
    pub fn content_type(&self) -> &str {
        if self.mime_type.trim().is_empty() {
            FALLBACK_CONTENT_TYPE
        } else {
            &self.mime_type
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mime: &str) -> FileMetadata {
        FileMetadata {
            message_id: MessageId::new(1),
            file_name: "a.bin".into(),
            file_size: 3,
            mime_type: mime.into(),
            remote_file_id: RemoteFileId::from("r1"),
        }
    }

    #[test]
    fn content_type_falls_back_when_unknown() {
        assert_eq!(sample("").content_type(), "application/octet-stream");
        assert_eq!(sample("  ").content_type(), "application/octet-stream");
        assert_eq!(sample("video/mp4").content_type(), "video/mp4");
    }

    #[test]
    fn deserializes_with_missing_optional_strings() {
        let json = r#"{"message_id": 5, "file_size": 10, "remote_file_id": "x"}"#;
        let meta: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.message_id, MessageId::new(5));
        assert!(meta.file_name.is_empty());
        assert!(meta.mime_type.is_empty());
    }
}
