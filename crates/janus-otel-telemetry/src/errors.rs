//! Telemetry error types.
//!
//! Only setup and teardown can fail. Dispatch never returns an error.

use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

/// Errors from building or shutting down the OpenTelemetry pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// An OTLP exporter could not be built from the settings.
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] ExporterBuildError),
    /// A provider failed to flush or shut down.
    #[error("telemetry provider shutdown failed: {0}")]
    Shutdown(#[from] OTelSdkError),
}

/// Result type for telemetry setup and teardown.
pub type Result<T> = std::result::Result<T, TelemetryError>;
