use serde::Deserialize;

/// HTTPS termination.
///
/// # Example
///
/// ```toml
/// [tls]
/// enabled = true
/// cert_path = "/etc/ssl/filestream.crt"
/// key_path = "/etc/ssl/filestream.key"
/// ```
#[derive(Debug, Deserialize)]
pub struct TlsConfig {
    /// Whether to serve HTTPS instead of plain HTTP.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the server certificate chain PEM file.
    #[serde(default)]
    pub cert_path: Option<String>,
    /// Path to the server private key PEM file.
    #[serde(default)]
    pub key_path: Option<String>,
    /// Minimum TLS version: `"1.2"` (default) or `"1.3"`.
    #[serde(default = "default_min_version")]
    pub min_version: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: None,
            key_path: None,
            min_version: default_min_version(),
        }
    }
}

fn default_min_version() -> String {
    "1.2".to_owned()
}
