mod cache;
mod links;
mod server;
mod telemetry;
mod tls;
mod workers;

#[cfg(test)]
mod tests;

pub use cache::*;
pub use links::*;
pub use server::*;
pub use telemetry::*;
pub use tls::*;
pub use workers::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the filestream server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct FilestreamConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// HTTPS termination.
    #[serde(default)]
    pub tls: TlsConfig,
    /// Metadata cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Link hashing parameters.
    #[serde(default)]
    pub links: LinksConfig,
    /// Worker sessions against the backing store.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl FilestreamConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load the configuration at `path`, or defaults if the file does not exist.
    ///
    /// Returns the configuration and whether the file was found.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, bool), ServerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok((Self::from_toml(&contents)?, true))
    }
}
