//! # janus-otel-telemetry
//!
//! Turns decoded gateway events and log lines into telemetry.
//!
//! - [`TelemetrySink`] / [`SessionSpan`]: the outbound seam
//! - [`SpanTable`]: one open span per live session, keyed by `session_id`
//! - [`EventDispatcher`]: decode, acquire, record, then close or enrich
//! - [`OtelSink`]: OTLP/HTTP export through the OpenTelemetry SDK
//! - [`RecordingSink`]: in-memory sink for tests and dry runs
//!
//! Everything here is owned and passed explicitly. Build one sink and one
//! dispatcher at startup and share the dispatcher between host threads.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod errors;
pub mod otel;
pub mod recording;
pub mod sink;
pub mod table;

pub use dispatcher::{BASE_EVENT_NAME, EventDispatcher, STATS_EVENT_NAME};
pub use errors::{Result, TelemetryError};
pub use otel::{OtelSink, OtelSpan, SESSION_ID_ATTRIBUTE};
pub use recording::{RecordedEvent, RecordedSpan, RecordingSink, RecordingSpan, RecordingSummary};
pub use sink::{SessionSpan, SpanKey, TelemetrySink};
pub use table::SpanTable;
