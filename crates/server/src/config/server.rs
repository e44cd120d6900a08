use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL generated links point at (e.g. `https://media.example.com`).
    ///
    /// If not set, defaults to `http://{host}:{port}` (`https` when TLS is
    /// enabled).
    pub public_url: Option<String>,
    /// Graceful shutdown timeout in seconds.
    ///
    /// Maximum time to wait for in-flight streams to finish after a
    /// shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
    /// Development mode: debug-level logging unless `RUST_LOG` says otherwise.
    #[serde(default)]
    pub dev: bool,
    /// Look up and log the machine's public IP at startup.
    #[serde(default = "default_lookup_public_ip")]
    pub lookup_public_ip: bool,
}

impl ServerConfig {
    /// The public base URL, falling back to the bind address.
    pub fn resolved_public_url(&self, tls: bool) -> String {
        self.public_url.clone().unwrap_or_else(|| {
            let scheme = if tls { "https" } else { "http" };
            format!("{scheme}://{}:{}", self.host, self.port)
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            shutdown_timeout_seconds: default_shutdown_timeout(),
            dev: false,
            lookup_public_ip: default_lookup_public_ip(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_lookup_public_ip() -> bool {
    true
}
