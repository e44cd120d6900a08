use std::time::Duration;

use serde::Deserialize;

/// Metadata cache sizing.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached message lookups.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Expire entries this many seconds after they were fetched.
    ///
    /// Entries never expire when unset; they are only evicted for capacity.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl CacheConfig {
    /// The configured TTL, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_seconds: None,
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}
