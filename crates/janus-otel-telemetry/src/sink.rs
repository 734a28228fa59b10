//! The outbound telemetry seam.

use std::fmt;

use janus_otel_core::{FlatAttributeSet, LogRecord};
use serde::Serialize;

/// Stable identity of one started span.
///
/// Two handles with the same key refer to the same underlying span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpanKey(pub u64);

impl fmt::Display for SpanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One in-flight span, owned by the [`SpanTable`](crate::SpanTable).
pub trait SessionSpan: Send + Sync {
    /// Identity of the underlying span.
    fn id(&self) -> SpanKey;

    /// Record a timestamped event with scalar attributes.
    fn add_event(&mut self, name: &str, attributes: &FlatAttributeSet);

    /// Finish the span and hand it to the exporter.
    fn end(&mut self);
}

/// Where spans and log records go.
///
/// Implementations own their transport. Nothing here may fail: export
/// errors stay inside the sink.
pub trait TelemetrySink: Send + Sync {
    /// Span type handed out by [`start_span`](Self::start_span).
    type Span: SessionSpan;

    /// Start the span covering `session_id`'s lifetime.
    fn start_span(&self, session_id: u64) -> Self::Span;

    /// Emit one log record.
    fn emit_log(&self, record: &LogRecord);
}
