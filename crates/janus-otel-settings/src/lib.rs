//! # janus-otel-settings
//!
//! Configuration for the Janus telemetry bridge.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`JanusOtelSettings::default()`]
//! 2. **Settings file**: `~/.janus/otel.json`, deep-merged over defaults
//! 3. **Environment variables**: `JANUS_OTEL_*` overrides (highest priority)
//!
//! Loading is an explicit startup step: the caller owns the returned value
//! and hands it to whatever needs it. There is no process-wide instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    parse_bool, parse_protocol, parse_u64_range, settings_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
