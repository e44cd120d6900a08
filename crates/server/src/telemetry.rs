//! Log subscriber setup with optional OTLP span export.

use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Sampler, SdkTracerProvider};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{OtlpConfig, OtlpProtocol, TelemetryConfig};

/// Keeps the tracer provider alive until [`TelemetryGuard::shutdown`].
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush buffered spans. Call once, right before the process exits.
    pub fn shutdown(mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            warn!(error = %e, "tracer provider shutdown failed");
        }
    }
}

/// Log level used when neither `RUST_LOG` nor `telemetry.log_filter` is set.
pub fn default_filter(dev: bool) -> &'static str {
    if dev { "debug" } else { "info" }
}

fn env_filter(config: &TelemetryConfig, dev: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config.log_filter.as_deref().unwrap_or(default_filter(dev));
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(default_filter(dev)))
    })
}

/// Install the global subscriber.
///
/// An exporter that fails to build is logged and skipped; it never stops
/// the server from starting.
pub fn init(config: &TelemetryConfig, dev: bool) -> TelemetryGuard {
    let registry = tracing_subscriber::registry()
        .with(env_filter(config, dev))
        .with(tracing_subscriber::fmt::layer());

    let Some(otlp) = &config.otlp else {
        registry.init();
        return TelemetryGuard { provider: None };
    };

    let exporter = match build_exporter(otlp) {
        Ok(exporter) => exporter,
        Err(e) => {
            registry.init();
            error!(error = %e, endpoint = %otlp.endpoint, "OTLP exporter unavailable, logging only");
            return TelemetryGuard { provider: None };
        }
    };

    global::set_text_map_propagator(TraceContextPropagator::new());
    let provider = SdkTracerProvider::builder()
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .with_sampler(sampler(otlp.sample_ratio))
        .with_resource(resource(otlp))
        .build();
    global::set_tracer_provider(provider.clone());

    registry
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("filestream")))
        .init();
    info!(
        endpoint = %otlp.endpoint,
        protocol = ?otlp.protocol,
        sample_ratio = otlp.sample_ratio,
        "exporting spans over OTLP"
    );

    TelemetryGuard {
        provider: Some(provider),
    }
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

fn resource(otlp: &OtlpConfig) -> Resource {
    let mut attributes = vec![
        KeyValue::new("service.name", otlp.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ];
    attributes.extend(
        otlp.resource_attributes
            .iter()
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone())),
    );
    Resource::builder().with_attributes(attributes).build()
}

fn build_exporter(
    otlp: &OtlpConfig,
) -> Result<opentelemetry_otlp::SpanExporter, opentelemetry::trace::TraceError> {
    let builder = opentelemetry_otlp::SpanExporter::builder();
    match otlp.protocol {
        OtlpProtocol::Grpc => builder
            .with_tonic()
            .with_endpoint(&otlp.endpoint)
            .with_timeout(otlp.timeout())
            .build(),
        OtlpProtocol::Http => builder
            .with_http()
            .with_endpoint(&otlp.endpoint)
            .with_timeout(otlp.timeout())
            .build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_logs_debug() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn sampler_clamps_ratio() {
        assert!(matches!(sampler(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler(2.0), Sampler::AlwaysOn));
        assert!(matches!(sampler(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler(0.5), Sampler::TraceIdRatioBased(r) if (r - 0.5).abs() < f64::EPSILON));
    }
}
