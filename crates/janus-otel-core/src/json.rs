//! Compact, ASCII-only JSON encoding.
//!
//! The `event` field of an [`EventRecord`](crate::EventRecord) keeps the
//! nested payload as text. It is written without whitespace and with every
//! non-ASCII character escaped as `\uXXXX` (UTF-16 code units, so characters
//! outside the BMP become surrogate pairs). Parsing the result yields the
//! original tree.

use std::io;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, Serializer};

/// Compact formatter that escapes non-ASCII characters.
///
/// All other formatting hooks keep `serde_json`'s compact defaults.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&bytes[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04X}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}

/// Serialize `value` as compact JSON with non-ASCII characters escaped.
pub fn encode_ascii_compact(value: &Value) -> String {
    let mut out = Vec::with_capacity(64);
    let mut serializer = Serializer::with_formatter(&mut out, AsciiFormatter);
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
