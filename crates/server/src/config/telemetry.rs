use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Logging and trace export settings.
///
/// ```toml
/// [telemetry]
/// log_filter = "info,filestream_gateway=debug"
///
/// [telemetry.otlp]
/// endpoint = "http://localhost:4317"
/// protocol = "grpc"
/// sample_ratio = 0.25
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset. Falls back to `info`
    /// (`debug` in dev mode).
    #[serde(default)]
    pub log_filter: Option<String>,
    /// OTLP span export. Spans stay local when this section is absent.
    #[serde(default)]
    pub otlp: Option<OtlpConfig>,
}

/// Where and how spans are exported.
#[derive(Debug, Deserialize)]
pub struct OtlpConfig {
    #[serde(default = "default_otlp_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub protocol: OtlpProtocol,
    /// Service name reported on every span.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Fraction of traces kept, from 0.0 to 1.0.
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: f64,
    #[serde(default = "default_export_timeout")]
    pub timeout_seconds: u64,
    /// Extra resource attributes, e.g. `deployment.environment`.
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
}

impl OtlpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// OTLP transport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_owned()
}

fn default_service_name() -> String {
    "filestream".to_owned()
}

fn default_sample_ratio() -> f64 {
    1.0
}

fn default_export_timeout() -> u64 {
    10
}
