use std::time::Duration;

use serde::Deserialize;

/// Worker sessions against the backing store.
///
/// # Example
///
/// ```toml
/// [workers]
/// backend = "http"
/// fetch_timeout_seconds = 30
///
/// [workers.http]
/// base_url = "http://127.0.0.1:8081"
/// primary_token = "main-session"
/// additional_tokens = ["worker-1", "worker-2"]
/// ```
#[derive(Debug, Deserialize)]
pub struct WorkersConfig {
    /// Which backend to use: `"memory"` or `"http"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Upper bound in seconds for each backing-store call.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    /// Settings for the `http` backend.
    #[serde(default)]
    pub http: HttpWorkersConfig,
    /// Settings for the `memory` backend.
    #[serde(default)]
    pub memory: MemoryWorkersConfig,
}

impl WorkersConfig {
    /// The configured fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            fetch_timeout_seconds: default_fetch_timeout(),
            http: HttpWorkersConfig::default(),
            memory: MemoryWorkersConfig::default(),
        }
    }
}

/// Sessions against an HTTP bridge, one bearer token per session.
#[derive(Debug, Deserialize)]
pub struct HttpWorkersConfig {
    /// Base URL of the bridge.
    #[serde(default = "default_bridge_url")]
    pub base_url: String,
    /// Token of the primary session. Required for the `http` backend.
    #[serde(default)]
    pub primary_token: Option<String>,
    /// Tokens of additional sessions. Sessions that fail to start are skipped.
    #[serde(default)]
    pub additional_tokens: Vec<String>,
    /// Per-request timeout in seconds for metadata and session lookups.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpWorkersConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            primary_token: None,
            additional_tokens: Vec::new(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// In-process sessions over files loaded at startup.
#[derive(Debug, Default, Deserialize)]
pub struct MemoryWorkersConfig {
    /// Sessions started in addition to the primary one.
    #[serde(default)]
    pub additional: usize,
    /// Files to serve, keyed by message id.
    #[serde(default)]
    pub files: Vec<MemoryFileConfig>,
}

/// A file served by the `memory` backend.
#[derive(Debug, Deserialize)]
pub struct MemoryFileConfig {
    /// Message id the file is attached to.
    pub message_id: i64,
    /// Path of the file on disk.
    pub path: String,
    /// Name reported to clients. Defaults to the file name of `path`.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type reported to clients.
    #[serde(default)]
    pub mime_type: String,
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8081".to_owned()
}

fn default_request_timeout() -> u64 {
    30
}
