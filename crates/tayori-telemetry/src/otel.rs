//! OTel internals: tracing layer and sampling.

use opentelemetry::trace::{
    Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
    TracerProvider as _,
};
use opentelemetry::{Context, KeyValue, global};
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, ShouldSample, SpanLimits};
use tracing_opentelemetry::OpenTelemetryLayer;

use crate::{TelemetryError, sample_rate};

/// Guard that shuts down the OTel tracer provider on drop, flushing pending spans.
pub struct OtelGuard {
    provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("OTel shutdown error: {e}");
        }
    }
}

/// Build an OpenTelemetry tracing layer and guard.
///
/// Must be called inside a tokio runtime; the batch exporter spawns onto
/// it. The guard must be held for the life of the process so spans flush.
pub fn otel_layer<S>(service_name: &str) -> Result<(OpenTelemetryLayer<S, SdkTracer>, OtelGuard), TelemetryError>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(TayoriSampler)
        .with_resource(resource)
        .with_span_limits(SpanLimits::default())
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer("tayori");
    let layer = tracing_opentelemetry::layer().with_tracer(tracer);

    Ok((layer, OtelGuard { provider }))
}

// ============================================================================
// TayoriSampler
// ============================================================================

/// Samples by span name prefix (see [`sample_rate`]), keeping sampled
/// parents' children and every error span.
#[derive(Debug, Clone)]
struct TayoriSampler;

/// Whether a span starts out flagged as failed.
fn is_error(attributes: &[KeyValue]) -> bool {
    attributes.iter().any(|kv| match kv.key.as_str() {
        "otel.status_code" => kv.value.as_str() == "ERROR",
        "error" => kv.value.as_str() == "true",
        _ => false,
    })
}

fn keep(trace_state: TraceState) -> SamplingResult {
    SamplingResult { decision: SamplingDecision::RecordAndSample, attributes: vec![], trace_state }
}

impl ShouldSample for TayoriSampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        span_kind: &SpanKind,
        attributes: &[KeyValue],
        links: &[Link],
    ) -> SamplingResult {
        if let Some(cx) = parent_context {
            let parent = cx.span();
            let parent = parent.span_context();
            if parent.is_sampled() {
                return keep(parent.trace_state().clone());
            }
        }
        if is_error(attributes) {
            return keep(TraceState::default());
        }
        Sampler::TraceIdRatioBased(sample_rate(name)).should_sample(
            parent_context,
            trace_id,
            name,
            span_kind,
            attributes,
            links,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags};

    // Low half of all ones sits above every ratio bound below 1.0.
    fn unlucky() -> TraceId {
        TraceId::from_bytes([0xff; 16])
    }

    fn decide(parent: Option<&Context>, name: &str, attributes: &[KeyValue]) -> SamplingDecision {
        TayoriSampler
            .should_sample(parent, unlucky(), name, &SpanKind::Internal, attributes, &[])
            .decision
    }

    fn parent(flags: TraceFlags) -> Context {
        let span = SpanContext::new(unlucky(), SpanId::from_bytes([1; 8]), flags, true, TraceState::default());
        Context::new().with_remote_span_context(span)
    }

    #[test]
    fn test_ratio_by_name() {
        assert_eq!(decide(None, "action.run", &[]), SamplingDecision::RecordAndSample);
        assert_eq!(decide(None, "store.apply", &[]), SamplingDecision::Drop);
    }

    #[test]
    fn test_sampled_parent_keeps_child() {
        let cx = parent(TraceFlags::SAMPLED);
        assert_eq!(decide(Some(&cx), "store.apply", &[]), SamplingDecision::RecordAndSample);

        let cx = parent(TraceFlags::default());
        assert_eq!(decide(Some(&cx), "store.apply", &[]), SamplingDecision::Drop);
    }

    #[test]
    fn test_error_spans_always_kept() {
        let status = [KeyValue::new("otel.status_code", "ERROR")];
        assert_eq!(decide(None, "store.apply", &status), SamplingDecision::RecordAndSample);
        let flag = [KeyValue::new("error", "true")];
        assert_eq!(decide(None, "store.apply", &flag), SamplingDecision::RecordAndSample);

        assert!(!is_error(&[KeyValue::new("otel.status_code", "OK")]));
        assert!(!is_error(&[KeyValue::new("error", "false")]));
    }
}
