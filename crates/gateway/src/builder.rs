use std::sync::Arc;
use std::time::Duration;

use filestream_core::LinkCodec;
use filestream_worker::WorkerPool;

use crate::cache::MetadataCache;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fluent builder for constructing a [`Gateway`] instance.
///
/// A [`WorkerPool`] and the public base URL must be supplied. Everything
/// else has defaults: an unkeyed codec with 16-character hashes, a cache of
/// 10 000 entries without expiry, and a 30 second backing-store timeout.
pub struct GatewayBuilder {
    pool: Option<Arc<WorkerPool>>,
    public_url: Option<String>,
    codec: LinkCodec,
    cache_capacity: u64,
    cache_ttl: Option<Duration>,
    fetch_timeout: Duration,
}

impl GatewayBuilder {
    /// Create a new builder with all optional fields set to their defaults.
    pub fn new() -> Self {
        Self {
            pool: None,
            public_url: None,
            codec: LinkCodec::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the worker pool requests are spread over.
    #[must_use]
    pub fn pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the base URL generated links point at (e.g. `https://media.example.com`).
    ///
    /// A trailing slash is ignored.
    #[must_use]
    pub fn public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Set the codec used to hash and verify links.
    #[must_use]
    pub fn codec(mut self, codec: LinkCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Maximum number of cached metadata entries.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Expire cached metadata this long after it was fetched.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Upper bound for each backing-store call.
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Consume the builder and produce a [`Gateway`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the pool or public URL is
    /// missing, or if the timeout is zero.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let pool = self
            .pool
            .ok_or_else(|| GatewayError::Configuration("worker pool is required".into()))?;

        let public_url = self
            .public_url
            .ok_or_else(|| GatewayError::Configuration("public URL is required".into()))?;
        let public_url = public_url.trim_end_matches('/').to_owned();
        if public_url.is_empty() {
            return Err(GatewayError::Configuration(
                "public URL must not be empty".into(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        let metrics = Arc::new(GatewayMetrics::default());
        let cache = MetadataCache::new(self.cache_capacity, self.cache_ttl, Arc::clone(&metrics));

        Ok(Gateway {
            pool,
            cache,
            codec: self.codec,
            public_url,
            fetch_timeout: self.fetch_timeout,
            metrics,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Arc<WorkerPool> {
        Arc::new(WorkerPool::new())
    }

    #[test]
    fn build_missing_pool_returns_error() {
        let result = GatewayBuilder::new().public_url("http://x").build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("worker pool is required"));
    }

    #[test]
    fn build_missing_public_url_returns_error() {
        let result = GatewayBuilder::new().pool(pool()).build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("public URL is required"));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        let result = GatewayBuilder::new()
            .pool(pool())
            .public_url("http://x")
            .fetch_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn build_trims_trailing_slash() {
        let gateway = GatewayBuilder::new()
            .pool(pool())
            .public_url("https://media.example.com/")
            .build()
            .unwrap();
        assert_eq!(gateway.public_url(), "https://media.example.com");
    }

    #[test]
    fn build_keeps_custom_codec() {
        let codec = LinkCodec::new(24).unwrap().with_secret("s3cret");
        let gateway = GatewayBuilder::new()
            .pool(pool())
            .public_url("http://x")
            .codec(codec)
            .build()
            .unwrap();
        assert_eq!(gateway.codec().length(), 24);
        assert!(gateway.codec().is_keyed());
    }
}
