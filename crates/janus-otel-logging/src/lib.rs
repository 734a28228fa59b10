//! # janus-otel-logging
//!
//! The bridge's own diagnostics go through `tracing` to stderr. They are
//! separate from the gateway telemetry the bridge exports.
//!
//! - [`init_subscriber`] installs a compact human-readable subscriber
//! - [`init_json_subscriber`] installs a JSON-lines subscriber
//! - [`test_utils::capture_logs`] captures events in memory for assertions
//!
//! `RUST_LOG` takes precedence over the level passed in.

#![deny(unsafe_code)]

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

use tracing_subscriber::EnvFilter;

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize the global subscriber with compact stderr output.
///
/// Call once at startup. Later calls are no-ops. An unparsable `level`
/// falls back to `warn`.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Initialize the global subscriber with JSON-lines stderr output.
///
/// Same rules as [`init_subscriber`].
pub fn init_json_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .flatten_event(true);

    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
