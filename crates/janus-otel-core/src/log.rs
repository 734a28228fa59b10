//! Gateway log lines and the records derived from them.

use serde::{Deserialize, Serialize};

use crate::attributes::FlatAttributeSet;
use crate::severity::{Severity, extract};

/// One line as queued by the gateway's logger.
///
/// Only these three fields are read; anything else the logger attaches is
/// ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// When the line was printed.
    #[serde(default)]
    pub timestamp: i64,
    /// Raw text, possibly prefixed with `<code>|`.
    #[serde(default)]
    pub line: String,
    /// Thread that printed the line.
    #[serde(default)]
    pub tid: i64,
}

/// A log line with its severity split off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Original timestamp.
    pub timestamp: i64,
    /// Message body, without the severity prefix.
    pub line: String,
    /// Parsed severity.
    pub severity: Severity,
    /// Thread ID.
    pub tid: i64,
}

impl LogRecord {
    /// Build a record from a raw gateway line.
    #[must_use]
    pub fn from_line(raw: &LogLine) -> Self {
        let (severity, offset) = extract(&raw.line);
        Self {
            timestamp: raw.timestamp,
            line: raw.line[offset..].to_owned(),
            severity,
            tid: raw.tid,
        }
    }

    /// Structured fields attached to the emitted record.
    #[must_use]
    pub fn attributes(&self) -> FlatAttributeSet {
        let mut attrs = FlatAttributeSet::new();
        let _ = attrs.insert("timestamp", self.timestamp);
        let _ = attrs.insert("tid", self.tid);
        attrs
    }
}
