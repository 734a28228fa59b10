//! Severity codes embedded in gateway log lines.
//!
//! The gateway's logger may prefix a line with a one-character level code
//! followed by `|`, e.g. `"E|connection failed"`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Log severity, from most to least severe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// `F`: unrecoverable.
    Fatal,
    /// `E`.
    Error,
    /// `W`.
    Warn,
    /// `I`, and the level of lines without a prefix.
    #[default]
    Info,
    /// `V`: verbose tracing.
    Verbose,
    /// `H`: huge debug output.
    Huge,
    /// `D`, and the level of unknown codes.
    Debug,
}

impl Severity {
    /// Map a prefix code to a severity. Unknown codes are [`Severity::Debug`].
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            b'F' => Self::Fatal,
            b'E' => Self::Error,
            b'W' => Self::Warn,
            b'I' => Self::Info,
            b'V' => Self::Verbose,
            b'H' => Self::Huge,
            _ => Self::Debug,
        }
    }

    /// Uppercase severity text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Verbose => "VERBOSE",
            Self::Huge => "HUGE",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split the severity prefix off a log line.
///
/// Returns the severity and the byte offset where the message body starts:
/// `2` when the line begins with `<code>|`, otherwise `0` with
/// [`Severity::Info`].
#[must_use]
pub fn extract(line: &str) -> (Severity, usize) {
    match line.as_bytes() {
        [code, b'|', ..] => (Severity::from_code(*code), 2),
        _ => (Severity::Info, 0),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
