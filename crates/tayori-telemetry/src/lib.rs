//! OpenTelemetry integration for Tayori.
//!
//! Provides the OTel tracing layer and a sampler with per-category rates.
//! Compiled in with the `telemetry` feature; without it only
//! [`otel_enabled`] and [`sample_rate`] exist.
//!
//! # Activation
//!
//! OTel export activates when standard OTel environment variables are set:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 tayori watch
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to explicitly disable even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

/// Errors setting up export.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("OTel export needs a running tokio runtime")]
    NoRuntime,
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),
}

/// Check whether OTel export should be enabled.
///
/// Returns `true` when standard OTel env vars indicate export is desired:
/// - `OTEL_SDK_DISABLED` is NOT set to `"true"`
/// - AND at least one of:
///   - `OTEL_EXPORTER_OTLP_ENDPOINT` is set
///   - `OTEL_TRACES_EXPORTER` is set (and not `"none"`)
pub fn otel_enabled() -> bool {
    enabled_from(|key| std::env::var(key).ok())
}

fn enabled_from(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Sampling rate for a span name.
///
/// | Prefix       | Rate |
/// |--------------|------|
/// | `action.*`   | 100% |
/// | `channel.*`  | 100% |
/// | other        | 10%  |
///
/// Errors are always sampled regardless of name.
pub fn sample_rate(name: &str) -> f64 {
    if name.starts_with("action") || name.starts_with("channel") {
        1.0
    } else {
        0.1
    }
}

// ============================================================================
// Tests
// ============================================================================
