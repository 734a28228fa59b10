//! In-memory sink that keeps everything it is given.
//!
//! Used by tests and by the agent's dry-run mode, where the summary is
//! printed instead of exported.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use janus_otel_core::{FlatAttributeSet, LogRecord};
use parking_lot::Mutex;
use serde::Serialize;

use crate::sink::{SessionSpan, SpanKey, TelemetrySink};

/// One event recorded on a span.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedEvent {
    /// Event name.
    pub name: String,
    /// Attributes as given.
    pub attributes: FlatAttributeSet,
}

/// Everything that happened to one span.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedSpan {
    /// Span identity, in start order from 1.
    pub key: SpanKey,
    /// Session the span was started for.
    pub session_id: u64,
    /// Events in record order.
    pub events: Vec<RecordedEvent>,
    /// How many times `end` was called. Anything but 0 or 1 is a bug.
    pub end_count: u32,
}

impl RecordedSpan {
    /// Whether the span has been ended.
    pub fn ended(&self) -> bool {
        self.end_count > 0
    }

    /// Names of the recorded events, in order.
    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Snapshot of a [`RecordingSink`].
#[derive(Clone, Debug, Serialize)]
pub struct RecordingSummary {
    /// All started spans, in start order.
    pub spans: Vec<RecordedSpan>,
    /// All emitted log records, in order.
    pub logs: Vec<LogRecord>,
}

/// Span handle returned by [`RecordingSink`].
pub struct RecordingSpan {
    key: SpanKey,
    state: Arc<Mutex<RecordedSpan>>,
}

impl SessionSpan for RecordingSpan {
    fn id(&self) -> SpanKey {
        self.key
    }

    fn add_event(&mut self, name: &str, attributes: &FlatAttributeSet) {
        self.state.lock().events.push(RecordedEvent {
            name: name.to_owned(),
            attributes: attributes.clone(),
        });
    }

    fn end(&mut self) {
        self.state.lock().end_count += 1;
    }
}

/// Sink that records spans and logs in memory.
#[derive(Default)]
pub struct RecordingSink {
    spans: Mutex<Vec<Arc<Mutex<RecordedSpan>>>>,
    logs: Mutex<Vec<LogRecord>>,
    next_key: AtomicU64,
}

impl RecordingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every span started so far, in start order.
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.spans.lock().iter().map(|s| s.lock().clone()).collect()
    }

    /// Spans started for `session_id`, in start order.
    pub fn spans_for(&self, session_id: u64) -> Vec<RecordedSpan> {
        self.spans()
            .into_iter()
            .filter(|s| s.session_id == session_id)
            .collect()
    }

    /// The span with `key`, if one was started.
    pub fn span(&self, key: SpanKey) -> Option<RecordedSpan> {
        self.spans.lock().iter().find_map(|s| {
            let span = s.lock();
            (span.key == key).then(|| span.clone())
        })
    }

    /// Every log record emitted so far.
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().clone()
    }

    /// Spans and logs together.
    pub fn summary(&self) -> RecordingSummary {
        RecordingSummary {
            spans: self.spans(),
            logs: self.logs(),
        }
    }
}

impl TelemetrySink for RecordingSink {
    type Span = RecordingSpan;

    fn start_span(&self, session_id: u64) -> RecordingSpan {
        let key = SpanKey(self.next_key.fetch_add(1, Ordering::Relaxed) + 1);
        let state = Arc::new(Mutex::new(RecordedSpan {
            key,
            session_id,
            events: Vec::new(),
            end_count: 0,
        }));
        self.spans.lock().push(Arc::clone(&state));
        RecordingSpan { key, state }
    }

    fn emit_log(&self, record: &LogRecord) {
        self.logs.lock().push(record.clone());
    }
}
