use filestream_core::{DEFAULT_HASH_LENGTH, LinkCodec};
use serde::Deserialize;

use crate::error::ServerError;

/// Environment variable overriding [`LinksConfig::secret`].
pub const LINK_SECRET_ENV: &str = "FILESTREAM_LINK_SECRET";

/// Link hashing parameters.
///
/// The hash length is a security parameter: every extra character adds six
/// bits an attacker has to guess. With a secret, hashes become HMACs and can
/// no longer be derived by anyone who knows a file's attributes.
#[derive(Debug, Deserialize)]
pub struct LinksConfig {
    /// Characters of the base64url digest kept in links (12 to 43).
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
    /// Optional server-side secret keying the link hash.
    #[serde(default)]
    pub secret: Option<String>,
}

impl LinksConfig {
    /// Build the link codec, preferring `secret_override` (from the
    /// environment) over the configured secret.
    pub fn codec(&self, secret_override: Option<String>) -> Result<LinkCodec, ServerError> {
        let codec = LinkCodec::new(self.hash_length)
            .map_err(|e| ServerError::Config(format!("links.hash_length: {e}")))?;
        match secret_override
            .or_else(|| self.secret.clone())
            .filter(|s| !s.is_empty())
        {
            Some(secret) => Ok(codec.with_secret(secret.into_bytes())),
            None => Ok(codec),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            hash_length: default_hash_length(),
            secret: None,
        }
    }
}

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}
