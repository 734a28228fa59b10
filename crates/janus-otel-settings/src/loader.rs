//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`JanusOtelSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `JANUS_OTEL_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{ExportProtocol, JanusOtelSettings};

/// Smallest accepted `JANUS_OTEL_TIMEOUT_MS`.
pub const MIN_TIMEOUT_MS: u64 = 100;
/// Largest accepted `JANUS_OTEL_TIMEOUT_MS`.
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Resolve the default settings file (`~/.janus/otel.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".janus").join("otel.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<JanusOtelSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. A file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<JanusOtelSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<JanusOtelSettings> {
    let defaults = serde_json::to_value(JanusOtelSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `JANUS_OTEL_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut JanusOtelSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty values are ignored. Invalid numbers and booleans are logged and
/// ignored, keeping the file/default value.
pub fn apply_overrides<F>(settings: &mut JanusOtelSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Exporter ────────────────────────────────────────────────────
    if let Some(v) = env.string("JANUS_OTEL_ENDPOINT") {
        settings.exporter.endpoint = v;
    }
    if let Some(v) = env.u64_range("JANUS_OTEL_TIMEOUT_MS", MIN_TIMEOUT_MS, MAX_TIMEOUT_MS) {
        settings.exporter.timeout_ms = v;
    }
    if let Some(v) = env.bool("JANUS_OTEL_BATCH") {
        settings.exporter.batch = v;
    }
    if let Some(v) = env.protocol("JANUS_OTEL_PROTOCOL") {
        settings.exporter.protocol = v;
    }

    // ── Naming ──────────────────────────────────────────────────────
    if let Some(v) = env.string("JANUS_OTEL_SERVICE_NAME") {
        settings.service.name = v;
    }
    if let Some(v) = env.string("JANUS_OTEL_SPAN_NAME") {
        settings.tracer.span_name = v;
    }

    // ── Diagnostics ─────────────────────────────────────────────────
    if let Some(v) = env.string("JANUS_OTEL_LOG_LEVEL") {
        settings.diagnostics.level = v;
    }
    if let Some(v) = env.bool("JANUS_OTEL_LOG_JSON") {
        settings.diagnostics.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse an exporter protocol name (`binary` or `json`, case-insensitive).
pub fn parse_protocol(val: &str) -> Option<ExportProtocol> {
    match val.to_lowercase().as_str() {
        "binary" | "protobuf" => Some(ExportProtocol::Binary),
        "json" => Some(ExportProtocol::Json),
        _ => None,
    }
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64_range(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, min, max, "invalid u64 env var, ignoring");
        }
        result
    }

    fn protocol(&self, name: &str) -> Option<ExportProtocol> {
        let val = self.string(name)?;
        let result = parse_protocol(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid protocol env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
