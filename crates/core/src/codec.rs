//! Link integrity codec.
//!
//! A stream link carries a short hash derived from the metadata its message
//! id resolves to. Nothing is persisted per link: verification re-packs the
//! freshly resolved metadata and recomputes the hash.
//!
//! The hash width is a security parameter. Every character carries six bits,
//! so the default of 16 characters gives 96 bits; the minimum of 12 gives 72.
//! Without a secret the digest is plain SHA-256 and anyone who knows a
//! file's attributes can derive its link. With a secret it becomes
//! HMAC-SHA256 and links can only be minted by the service.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CoreError;
use crate::metadata::FileMetadata;

type HmacSha256 = Hmac<Sha256>;

/// Smallest accepted hash length in characters (72 bits).
pub const MIN_HASH_LENGTH: usize = 12;
/// Largest accepted hash length: an untruncated base64url SHA-256 digest.
pub const MAX_HASH_LENGTH: usize = 43;
/// Default hash length in characters (96 bits).
pub const DEFAULT_HASH_LENGTH: usize = 16;

/// Pack file attributes into a canonical byte string.
///
/// Variable-length fields are length-prefixed so that no two distinct inputs
/// share an encoding (`name="a\n1", size=2` vs `name="a", size=1`).
pub fn pack(file_name: &str, file_size: u64, mime_type: &str, remote_file_id: &str) -> Vec<u8> {
    format!(
        "{}:{}\n{}\n{}:{}\n{}:{}",
        file_name.len(),
        file_name,
        file_size,
        mime_type.len(),
        mime_type,
        remote_file_id.len(),
        remote_file_id,
    )
    .into_bytes()
}

/// Derive a URL-safe short hash of `packed`.
///
/// Uses HMAC-SHA256 when `key` is set, plain SHA-256 otherwise, then encodes
/// as unpadded base64url and keeps the first `length` characters.
pub fn short_hash(packed: &[u8], key: Option<&[u8]>, length: usize) -> String {
    let digest = match key {
        Some(key) => {
            let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
            mac.update(packed);
            mac.finalize().into_bytes().to_vec()
        }
        None => Sha256::digest(packed).to_vec(),
    };
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(length.min(MAX_HASH_LENGTH));
    encoded
}

/// Hashes and verifies stream links for resolved metadata.
#[derive(Clone)]
pub struct LinkCodec {
    key: Option<Vec<u8>>,
    length: usize,
}

impl LinkCodec {
    /// Create a codec producing hashes of `length` characters.
    pub fn new(length: usize) -> Result<Self, CoreError> {
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&length) {
            return Err(CoreError::InvalidHashLength {
                length,
                min: MIN_HASH_LENGTH,
                max: MAX_HASH_LENGTH,
            });
        }
        Ok(Self { key: None, length })
    }

    /// Key the hash with a server-side secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.key = Some(secret.into());
        self
    }

    /// Configured hash length in characters.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether hashes are keyed with a secret.
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    /// Compute the link hash for `metadata`.
    pub fn hash(&self, metadata: &FileMetadata) -> String {
        let packed = pack(
            &metadata.file_name,
            metadata.file_size,
            &metadata.mime_type,
            metadata.remote_file_id.as_str(),
        );
        short_hash(&packed, self.key.as_deref(), self.length)
    }

    /// Check a client-supplied hash against `metadata` in constant time.
    pub fn verify(&self, metadata: &FileMetadata, supplied: &str) -> bool {
        let expected = self.hash(metadata);
        expected.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

impl Default for LinkCodec {
    fn default() -> Self {
        Self {
            key: None,
            length: DEFAULT_HASH_LENGTH,
        }
    }
}

impl fmt::Debug for LinkCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCodec")
            .field("keyed", &self.key.is_some())
            .field("length", &self.length)
            .finish()
    }
}
