//! Per-event orchestration.
//!
//! For each event envelope:
//! 1. decode it into an [`EventRecord`](janus_otel_core::EventRecord)
//! 2. record [`BASE_EVENT_NAME`] with the seven envelope fields on the
//!    session's span; a session `destroyed` event takes the span out of the
//!    table first and ends it after recording
//! 3. a media event adds a flattened [`STATS_EVENT_NAME`] event
//!
//! Log lines bypass the span table and go straight to the sink.

use std::sync::Arc;

use janus_otel_core::event::{event_name, payload};
use janus_otel_core::{EventType, LogLine, LogRecord, SESSION_DESTROYED, decode, flatten};
use serde_json::Value;
use tracing::{debug, trace};

use crate::sink::{SessionSpan, TelemetrySink};
use crate::table::SpanTable;

/// Name of the event recorded on the session span for every envelope.
pub const BASE_EVENT_NAME: &str = "JanusTraceEvent";
/// Name of the flattened media statistics event.
pub const STATS_EVENT_NAME: &str = "stats";

/// Routes gateway events and log lines into a [`TelemetrySink`].
///
/// Safe to share between threads. Never fails: malformed input is recorded
/// with default values.
pub struct EventDispatcher<K: TelemetrySink> {
    sink: Arc<K>,
    spans: SpanTable<K>,
}

impl<K: TelemetrySink> EventDispatcher<K> {
    /// A dispatcher with an empty span table.
    pub fn new(sink: Arc<K>) -> Self {
        Self {
            spans: SpanTable::new(Arc::clone(&sink)),
            sink,
        }
    }

    /// Handle one event envelope. `None` stands for absent input.
    pub fn dispatch(&self, envelope: Option<&Value>) {
        if envelope.is_none() {
            debug!("absent event envelope, recording defaults");
        }
        let record = decode(envelope);
        trace!(%record, "decoded event");

        let base = record.base_attributes();
        let category = record.category();
        if category == Some(EventType::Session) && event_name(envelope) == Some(SESSION_DESTROYED) {
            self.spans
                .close_with(record.session_id, |span| span.add_event(BASE_EVENT_NAME, &base));
            return;
        }

        let mut span = self.spans.acquire(record.session_id);
        span.add_event(BASE_EVENT_NAME, &base);

        match category {
            Some(EventType::Media) => {
                let stats = flatten(base, payload(envelope).unwrap_or(&Value::Null));
                span.add_event(STATS_EVENT_NAME, &stats);
            }
            Some(_) => {}
            None => trace!(event_type = record.event_type, "unknown event category"),
        }
    }

    /// Handle one gateway log line.
    pub fn log_line(&self, line: &LogLine) {
        self.sink.emit_log(&LogRecord::from_line(line));
    }

    /// End every span still open. Returns how many were ended.
    pub fn shutdown(&self) -> usize {
        let ended = self.spans.drain();
        if ended > 0 {
            debug!(count = ended, "ended open session spans at shutdown");
        }
        ended
    }

    /// The span table.
    pub fn spans(&self) -> &SpanTable<K> {
        &self.spans
    }

    /// The sink.
    pub fn sink(&self) -> &Arc<K> {
        &self.sink
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
