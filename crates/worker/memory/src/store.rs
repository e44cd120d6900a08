use bytes::Bytes;
use dashmap::DashMap;

use filestream_core::{FileMetadata, MessageId, RemoteFileId};

/// In-memory stand-in for the chat-based backing store.
///
/// Messages map to file metadata; metadata points at an object holding the
/// file contents. Both maps are [`DashMap`]s so workers can read
/// concurrently while tests rewrite entries.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    messages: DashMap<MessageId, FileMetadata>,
    objects: DashMap<RemoteFileId, Bytes>,
}

impl MemoryContentStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` as a new object and attach it to `message_id`.
    ///
    /// The file size is taken from `data`. Returns the stored metadata.
    pub fn put_file(
        &self,
        message_id: MessageId,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        remote_file_id: impl Into<RemoteFileId>,
        data: impl Into<Bytes>,
    ) -> FileMetadata {
        let data = data.into();
        let metadata = FileMetadata {
            message_id,
            file_name: file_name.into(),
            file_size: data.len() as u64,
            mime_type: mime_type.into(),
            remote_file_id: remote_file_id.into(),
        };
        self.objects.insert(metadata.remote_file_id.clone(), data);
        self.messages.insert(message_id, metadata.clone());
        metadata
    }

    /// Replace the metadata of a message without touching object contents.
    pub fn put_metadata(&self, metadata: FileMetadata) {
        self.messages.insert(metadata.message_id, metadata);
    }

    /// Delete a message. Returns `true` if it existed.
    pub fn remove_message(&self, message_id: MessageId) -> bool {
        self.messages.remove(&message_id).is_some()
    }

    /// Metadata attached to `message_id`, if any.
    pub fn metadata(&self, message_id: MessageId) -> Option<FileMetadata> {
        self.messages.get(&message_id).map(|m| m.clone())
    }

    /// Contents of the object `remote_file_id`, if any.
    pub fn object(&self, remote_file_id: &RemoteFileId) -> Option<Bytes> {
        self.objects.get(remote_file_id).map(|b| b.clone())
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_file_derives_size() {
        let store = MemoryContentStore::new();
        let meta = store.put_file(MessageId::new(1), "a.txt", "text/plain", "obj-1", "hello");
        assert_eq!(meta.file_size, 5);
        assert_eq!(store.metadata(MessageId::new(1)), Some(meta.clone()));
        assert_eq!(store.object(&meta.remote_file_id).unwrap(), "hello");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_metadata_overwrites() {
        let store = MemoryContentStore::new();
        let mut meta = store.put_file(MessageId::new(1), "a.txt", "", "obj-1", "x");
        meta.file_name = "renamed.txt".into();
        store.put_metadata(meta);
        assert_eq!(
            store.metadata(MessageId::new(1)).unwrap().file_name,
            "renamed.txt"
        );
    }

    #[test]
    fn remove_message() {
        let store = MemoryContentStore::new();
        store.put_file(MessageId::new(1), "a", "", "o", "x");
        assert!(store.remove_message(MessageId::new(1)));
        assert!(!store.remove_message(MessageId::new(1)));
        assert!(store.is_empty());
    }
}
