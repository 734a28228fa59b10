//! # janus-otel-core
//!
//! Pure mapping logic shared by the Janus telemetry bridge.
//!
//! - **Events**: [`EventRecord`] and [`decode`], the schema-less field decoder
//!   for gateway event envelopes
//! - **Attributes**: [`FlatAttributeSet`] and [`flatten`], scalar-only
//!   attribute sets with key normalization
//! - **Logs**: [`LogLine`], [`LogRecord`] and [`extract`], the one-character
//!   severity prefix parser
//!
//! Nothing here performs I/O or can fail: malformed input degrades to
//! defaults.

#![deny(unsafe_code)]

pub mod attributes;
pub mod event;
pub mod json;
pub mod log;
pub mod severity;

pub use attributes::{AttrValue, FlatAttributeSet, flatten, normalize_key};
pub use event::{EventRecord, EventType, SESSION_DESTROYED, decode};
pub use json::encode_ascii_compact;
pub use log::{LogLine, LogRecord};
pub use severity::{Severity, extract};
