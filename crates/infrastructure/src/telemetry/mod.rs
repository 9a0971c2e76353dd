//! Logging and distributed tracing
//!
//! Console logging is always installed; OTLP span export is optional.

mod otel;

pub use otel::{TelemetryConfig, TelemetryError, TelemetryGuard, init_telemetry};
