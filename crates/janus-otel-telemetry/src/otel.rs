//! OpenTelemetry sink.
//!
//! Session spans and gateway log records are exported over OTLP/HTTP. The
//! sink is built once at startup from [`JanusOtelSettings`] and must be shut
//! down explicitly so batched data is flushed.

use std::time::Duration;

use janus_otel_core::{AttrValue, FlatAttributeSet, LogRecord, Severity};
use janus_otel_settings::{ExportProtocol, JanusOtelSettings};
use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, LoggerProvider as _};
use opentelemetry::trace::{Span as _, SpanKind, Tracer as _, TracerProvider as _};
use opentelemetry::{InstrumentationScope, KeyValue, Value, logs};
use opentelemetry_otlp::{LogExporter, Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use tracing::debug;

use crate::errors::Result;
use crate::sink::{SessionSpan, SpanKey, TelemetrySink};

/// Span attribute carrying the session the span covers.
pub const SESSION_ID_ATTRIBUTE: &str = "janus.session_id";

/// [`TelemetrySink`] backed by OpenTelemetry SDK providers.
pub struct OtelSink {
    tracer_provider: SdkTracerProvider,
    logger_provider: SdkLoggerProvider,
    tracer: SdkTracer,
    logger: SdkLogger,
    span_name: String,
}

impl OtelSink {
    /// Build OTLP/HTTP exporters and providers from settings.
    pub fn from_settings(settings: &JanusOtelSettings) -> Result<Self> {
        let exporter = &settings.exporter;
        let protocol = match exporter.protocol {
            ExportProtocol::Binary => Protocol::HttpBinary,
            ExportProtocol::Json => Protocol::HttpJson,
        };
        let timeout = Duration::from_millis(exporter.timeout_ms);

        let resource = Resource::builder()
            .with_service_name(settings.service.name.clone())
            .with_attributes([KeyValue::new(SERVICE_VERSION, settings.service.version.clone())])
            .build();

        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_protocol(protocol)
            .with_endpoint(exporter.traces_endpoint())
            .with_timeout(timeout)
            .build()?;
        let log_exporter = LogExporter::builder()
            .with_http()
            .with_protocol(protocol)
            .with_endpoint(exporter.logs_endpoint())
            .with_timeout(timeout)
            .build()?;

        let tracer_builder = SdkTracerProvider::builder().with_resource(resource.clone());
        let logger_builder = SdkLoggerProvider::builder().with_resource(resource);
        let (tracer_provider, logger_provider) = if exporter.batch {
            (
                tracer_builder.with_batch_exporter(span_exporter).build(),
                logger_builder.with_batch_exporter(log_exporter).build(),
            )
        } else {
            (
                tracer_builder.with_simple_exporter(span_exporter).build(),
                logger_builder.with_simple_exporter(log_exporter).build(),
            )
        };

        debug!(
            endpoint = %exporter.endpoint,
            ?protocol,
            batch = exporter.batch,
            "OTLP exporters configured"
        );
        Ok(Self::new(tracer_provider, logger_provider, settings))
    }

    /// Wrap existing providers. Naming comes from `settings`.
    pub fn new(
        tracer_provider: SdkTracerProvider,
        logger_provider: SdkLoggerProvider,
        settings: &JanusOtelSettings,
    ) -> Self {
        let tracer = tracer_provider.tracer(settings.tracer.name.clone());
        let logger = logger_provider.logger_with_scope(
            InstrumentationScope::builder(settings.logger.name.clone())
                .with_version(settings.logger.version.clone())
                .build(),
        );
        Self {
            tracer_provider,
            logger_provider,
            tracer,
            logger,
            span_name: settings.tracer.span_name.clone(),
        }
    }

    /// Flush and shut down both providers.
    ///
    /// Both are always attempted; the first failure is returned.
    pub fn shutdown(&self) -> Result<()> {
        let traces = self.tracer_provider.shutdown();
        let logs = self.logger_provider.shutdown();
        traces?;
        logs?;
        Ok(())
    }
}

impl TelemetrySink for OtelSink {
    type Span = OtelSpan;

    fn start_span(&self, session_id: u64) -> OtelSpan {
        let inner = self
            .tracer
            .span_builder(self.span_name.clone())
            .with_kind(SpanKind::Internal)
            .with_attributes([KeyValue::new(
                SESSION_ID_ATTRIBUTE,
                to_otel_value(&AttrValue::UInt(session_id)),
            )])
            .start(&self.tracer);
        let key = SpanKey(u64::from_be_bytes(inner.span_context().span_id().to_bytes()));
        OtelSpan { inner, key }
    }

    fn emit_log(&self, record: &LogRecord) {
        let mut log = self.logger.create_log_record();
        log.set_severity_number(to_otel_severity(record.severity));
        log.set_severity_text(record.severity.as_str());
        log.set_body(AnyValue::String(record.line.clone().into()));
        for (key, value) in &record.attributes() {
            log.add_attribute(key.clone(), to_any_value(value));
        }
        self.logger.emit(log);
    }
}

/// A session span exported through OpenTelemetry.
pub struct OtelSpan {
    inner: opentelemetry_sdk::trace::Span,
    key: SpanKey,
}

impl SessionSpan for OtelSpan {
    fn id(&self) -> SpanKey {
        self.key
    }

    fn add_event(&mut self, name: &str, attributes: &FlatAttributeSet) {
        self.inner.add_event(name.to_owned(), to_key_values(attributes));
    }

    fn end(&mut self) {
        self.inner.end();
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

fn to_key_values(attributes: &FlatAttributeSet) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), to_otel_value(value)))
        .collect()
}

/// OTLP integers are signed: unsigned values past `i64::MAX` become text.
fn to_otel_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::String(s) => Value::from(s.clone()),
        AttrValue::Int(n) => Value::I64(*n),
        AttrValue::UInt(n) => match i64::try_from(*n) {
            Ok(n) => Value::I64(n),
            Err(_) => Value::from(n.to_string()),
        },
        AttrValue::Float(n) => Value::F64(*n),
    }
}

fn to_any_value(value: &AttrValue) -> AnyValue {
    match value {
        AttrValue::String(s) => AnyValue::String(s.clone().into()),
        AttrValue::Int(n) => AnyValue::Int(*n),
        AttrValue::UInt(n) => match i64::try_from(*n) {
            Ok(n) => AnyValue::Int(n),
            Err(_) => AnyValue::String(n.to_string().into()),
        },
        AttrValue::Float(n) => AnyValue::Double(*n),
    }
}

fn to_otel_severity(severity: Severity) -> logs::Severity {
    match severity {
        Severity::Fatal => logs::Severity::Fatal,
        Severity::Error => logs::Severity::Error,
        Severity::Warn => logs::Severity::Warn,
        Severity::Info => logs::Severity::Info,
        Severity::Verbose => logs::Severity::Debug3,
        Severity::Huge => logs::Severity::Debug2,
        Severity::Debug => logs::Severity::Debug,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
