use std::time::Duration;

/// Connection settings shared by every session against one bridge.
#[derive(Debug, Clone)]
pub struct HttpWorkerConfig {
    /// Base URL of the bridge (e.g. `http://127.0.0.1:8081`).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpWorkerConfig {
    /// Create a config with the default 30 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
