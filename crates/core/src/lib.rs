pub mod codec;
pub mod error;
pub mod metadata;
pub mod range;
pub mod types;

pub use codec::{
    DEFAULT_HASH_LENGTH, LinkCodec, MAX_HASH_LENGTH, MIN_HASH_LENGTH, pack, short_hash,
};
pub use error::CoreError;
pub use metadata::FileMetadata;
pub use range::{ByteRange, RangeError, RangeSpec};
pub use types::{MessageId, RemoteFileId};
