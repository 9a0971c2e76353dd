//! Tracing subscriber setup with optional OTLP span export
//!
//! Console output is text or JSON per `server.log_format`. When export is
//! enabled and the exporter cannot be built, `graceful_fallback` decides
//! between console-only logging and a startup error.

use std::time::Duration;

use opentelemetry::{KeyValue, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Configuration for logging and trace export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether OpenTelemetry export is enabled
    #[serde(default)]
    pub enabled: bool,

    /// OTLP endpoint URL (e.g., "http://localhost:4317" for gRPC)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Service name attached to exported spans
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Sampling ratio (0.0 - 1.0)
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,

    /// Export timeout in seconds
    #[serde(default = "default_export_timeout")]
    pub export_timeout_secs: u64,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Continue with console-only logging if the exporter cannot be built
    #[serde(default = "crate::config::default_true")]
    pub graceful_fallback: bool,
}

const fn default_sampling_ratio() -> f64 {
    1.0
}

const fn default_export_timeout() -> u64 {
    10
}

fn default_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "formrelay".to_string()
}

fn default_log_filter() -> String {
    "formrelay=info,infrastructure=info,application=info,presentation_http=info,tower_http=info"
        .to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
            export_timeout_secs: default_export_timeout(),
            log_filter: default_log_filter(),
            graceful_fallback: true,
        }
    }
}

impl TelemetryConfig {
    fn sampler(&self) -> Sampler {
        if self.sampling_ratio >= 1.0 {
            Sampler::AlwaysOn
        } else if self.sampling_ratio <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(self.sampling_ratio)
        }
    }
}

/// Guard that flushes and shuts down the tracer provider when dropped
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    #[must_use]
    pub const fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("exporting", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::error!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}

fn build_provider(config: &TelemetryConfig) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .with_timeout(Duration::from_secs(config.export_timeout_secs))
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder_empty()
        .with_attributes(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(config.sampler())
        .with_resource(resource)
        .build())
}

/// Install the global tracing subscriber
///
/// Keep the returned guard alive for the lifetime of the process; dropping
/// it flushes pending spans.
pub fn init_telemetry(
    config: &TelemetryConfig,
    format: LogFormat,
) -> Result<TelemetryGuard, TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let mut fallback_reason = None;
    let provider = if config.enabled {
        match build_provider(config) {
            Ok(provider) => Some(provider),
            Err(e) if config.graceful_fallback => {
                fallback_reason = Some(e.to_string());
                None
            },
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(config.service_name.clone()))
    });
    let text_layer = (format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
    });
    let json_layer = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    if let Some(reason) = fallback_reason {
        warn!(
            endpoint = %config.endpoint,
            error = %reason,
            "OTLP exporter unavailable, falling back to console-only logging"
        );
    }

    if provider.is_some() {
        info!(
            endpoint = %config.endpoint,
            service = %config.service_name,
            sampling = config.sampling_ratio,
            %format,
            "Telemetry initialized with OTLP export"
        );
    } else {
        info!(%format, "Telemetry initialized (console only)");
    }

    Ok(TelemetryGuard { provider })
}

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),

    /// Failed to create the OTLP exporter
    #[error("Failed to create OTLP exporter: {0}")]
    Exporter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_console_only() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.endpoint, "http://localhost:4317");
        assert_eq!(config.service_name, "formrelay");
        assert!(config.log_filter.contains("tower_http=info"));
        assert!(config.graceful_fallback);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: TelemetryConfig =
            serde_json::from_str(r#"{"enabled": true, "endpoint": "http://tempo:4317"}"#).unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.endpoint, "http://tempo:4317");
        assert!(parsed.graceful_fallback);
        assert_eq!(parsed.export_timeout_secs, 10);
    }

    #[test]
    fn sampler_follows_ratio() {
        let mut config = TelemetryConfig::default();
        assert!(matches!(config.sampler(), Sampler::AlwaysOn));

        config.sampling_ratio = 0.0;
        assert!(matches!(config.sampler(), Sampler::AlwaysOff));

        config.sampling_ratio = 0.25;
        assert!(matches!(
            config.sampler(),
            Sampler::TraceIdRatioBased(r) if (r - 0.25).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn inactive_guard_drops_cleanly() {
        let guard = TelemetryGuard { provider: None };
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
