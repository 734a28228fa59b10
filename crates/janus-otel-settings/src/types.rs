//! Settings types.
//!
//! Every struct uses `#[serde(default)]` so partial JSON files deserialize
//! cleanly, and camelCase keys to match the on-disk format.

use serde::{Deserialize, Serialize};

/// Root settings for the telemetry bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JanusOtelSettings {
    /// Resource identity attached to every exported span and log.
    pub service: ServiceSettings,
    /// Tracer and session-span naming.
    pub tracer: TracerSettings,
    /// Logger naming.
    pub logger: LoggerSettings,
    /// OTLP export.
    pub exporter: ExporterSettings,
    /// The bridge's own diagnostic output.
    pub diagnostics: DiagnosticsSettings,
}

/// `service.*` resource attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSettings {
    /// `service.name`.
    pub name: String,
    /// `service.version`.
    pub version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "janus_gateway".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Tracer scope and span naming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracerSettings {
    /// Instrumentation scope name of the tracer.
    pub name: String,
    /// Name given to every session span.
    pub span_name: String,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            name: "janus_gateway".into(),
            span_name: "span".into(),
        }
    }
}

/// Logger scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerSettings {
    /// Instrumentation scope name of the logger.
    pub name: String,
    /// Instrumentation scope version of the logger.
    pub version: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            name: "JanusLogger".into(),
            version: "v1.0.0".into(),
        }
    }
}

/// OTLP/HTTP encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportProtocol {
    /// Protobuf bodies.
    #[default]
    Binary,
    /// JSON bodies.
    Json,
}

/// Where and how spans and logs are shipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExporterSettings {
    /// Collector base URL. `/v1/traces` and `/v1/logs` are appended.
    pub endpoint: String,
    /// Body encoding.
    pub protocol: ExportProtocol,
    /// Per-request export timeout.
    pub timeout_ms: u64,
    /// Batch spans and logs in the background instead of exporting each
    /// one as it finishes.
    pub batch: bool,
}

impl ExporterSettings {
    /// Full URL of the trace endpoint.
    #[must_use]
    pub fn traces_endpoint(&self) -> String {
        format!("{}/v1/traces", self.endpoint.trim_end_matches('/'))
    }

    /// Full URL of the log endpoint.
    #[must_use]
    pub fn logs_endpoint(&self) -> String {
        format!("{}/v1/logs", self.endpoint.trim_end_matches('/'))
    }
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4318".into(),
            protocol: ExportProtocol::Binary,
            timeout_ms: 10_000,
            batch: true,
        }
    }
}

/// Diagnostic output of the bridge process itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Emit diagnostics as JSON lines.
    pub json: bool,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
        }
    }
}
