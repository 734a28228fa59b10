//! NDJSON replay into an [`EventDispatcher`].
//!
//! Each non-blank line is one JSON document. Lines that are not UTF-8 or do
//! not parse are skipped with a warning and never reach the dispatcher. For event
//! streams, a literal `null` line stands for absent input.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use janus_otel_core::LogLine;
use janus_otel_telemetry::{EventDispatcher, TelemetrySink};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Marker for standard input in place of a path.
pub const STDIN: &str = "-";

/// Line counts from one replayed stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Lines handed to the dispatcher.
    pub dispatched: usize,
    /// Lines that failed to parse.
    pub skipped: usize,
}

/// Open `source` for reading: a file path, or [`STDIN`].
pub fn open_input(source: &str) -> Result<Box<dyn BufRead>> {
    if source == STDIN {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let path = Path::new(source);
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Dispatch every event envelope in `reader`.
pub fn replay_events<K, R>(dispatcher: &EventDispatcher<K>, reader: R) -> Result<ReplayStats>
where
    K: TelemetrySink,
    R: BufRead,
{
    replay(reader, "event", |line| {
        let envelope: Value = serde_json::from_str(line)?;
        if envelope.is_null() {
            dispatcher.dispatch(None);
        } else {
            dispatcher.dispatch(Some(&envelope));
        }
        Ok(())
    })
}

/// Emit every `{timestamp, line, tid}` record in `reader`.
pub fn replay_logs<K, R>(dispatcher: &EventDispatcher<K>, reader: R) -> Result<ReplayStats>
where
    K: TelemetrySink,
    R: BufRead,
{
    replay(reader, "log", |line| {
        let log: LogLine = serde_json::from_str(line)?;
        dispatcher.log_line(&log);
        Ok(())
    })
}

fn replay<R, F>(mut reader: R, kind: &'static str, mut handle: F) -> Result<ReplayStats>
where
    R: BufRead,
    F: FnMut(&str) -> serde_json::Result<()>,
{
    let mut stats = ReplayStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read {kind} line {}", line_no + 1))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(error) => {
                warn!(kind, line = line_no, %error, "skipping unparsable line");
                stats.skipped += 1;
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match handle(trimmed) {
            Ok(()) => stats.dispatched += 1,
            Err(error) => {
                warn!(kind, line = line_no, %error, "skipping unparsable line");
                stats.skipped += 1;
            }
        }
    }
    debug!(kind, dispatched = stats.dispatched, skipped = stats.skipped, "replay finished");
    Ok(stats)
}
