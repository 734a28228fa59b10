//! # janus-otel-agent
//!
//! Stands in for the gateway's event-handler and logger hooks: replays
//! NDJSON event envelopes and log lines through the telemetry bridge and
//! exports the result over OTLP/HTTP.

#![deny(unsafe_code)]

mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser};
use janus_otel_settings::JanusOtelSettings;
use janus_otel_telemetry::{EventDispatcher, OtelSink, RecordingSink, RecordingSummary, TelemetrySink};
use serde::Serialize;

use crate::replay::{ReplayStats, STDIN, open_input, replay_events, replay_logs};

/// Janus gateway telemetry bridge.
#[derive(Parser, Debug)]
#[command(name = "janus-otel-agent", about = "Replay Janus events and logs as OpenTelemetry")]
#[command(group(ArgGroup::new("input").required(true).multiple(true).args(["events", "logs"])))]
struct Cli {
    /// NDJSON file of event envelopes (`-` for stdin).
    #[arg(long)]
    events: Option<String>,

    /// NDJSON file of `{timestamp, line, tid}` log records (`-` for stdin).
    #[arg(long)]
    logs: Option<String>,

    /// Settings file (defaults to `~/.janus/otel.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Collector base URL (overrides settings and environment).
    #[arg(long)]
    endpoint: Option<String>,

    /// Record in memory and print a JSON summary instead of exporting.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if self.events.as_deref() == Some(STDIN) && self.logs.as_deref() == Some(STDIN) {
            bail!("--events and --logs cannot both read from stdin");
        }
        Ok(())
    }

    fn load_settings(&self) -> Result<JanusOtelSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(janus_otel_settings::settings_path);
        let mut settings = janus_otel_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        if let Some(endpoint) = &self.endpoint {
            settings.exporter.endpoint.clone_from(endpoint);
        }
        Ok(settings)
    }
}

/// Replay counts for both streams.
#[derive(Debug, Default, Serialize)]
struct RunStats {
    events: ReplayStats,
    logs: ReplayStats,
    /// Spans still open at the end, ended by shutdown.
    leaked_spans: usize,
}

#[derive(Serialize)]
struct DryRunReport {
    stats: RunStats,
    #[serde(flatten)]
    recorded: RecordingSummary,
}

fn run<K: TelemetrySink>(cli: &Cli, dispatcher: &EventDispatcher<K>) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let replayed = replay_all(cli, dispatcher, &mut stats);
    stats.leaked_spans = dispatcher.shutdown();
    replayed.map(|()| stats)
}

fn replay_all<K: TelemetrySink>(cli: &Cli, dispatcher: &EventDispatcher<K>, stats: &mut RunStats) -> Result<()> {
    if let Some(source) = &cli.events {
        stats.events = replay_events(dispatcher, open_input(source)?)
            .with_context(|| format!("Failed to replay events from {source}"))?;
    }
    if let Some(source) = &cli.logs {
        stats.logs = replay_logs(dispatcher, open_input(source)?)
            .with_context(|| format!("Failed to replay logs from {source}"))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;

    let settings = cli.load_settings()?;
    if settings.diagnostics.json {
        janus_otel_logging::init_json_subscriber(&settings.diagnostics.level);
    } else {
        janus_otel_logging::init_subscriber(&settings.diagnostics.level);
    }

    if cli.dry_run {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = EventDispatcher::new(Arc::clone(&sink));
        let stats = run(&cli, &dispatcher)?;
        let report = DryRunReport {
            stats,
            recorded: sink.summary(),
        };
        let out = serde_json::to_string_pretty(&report).context("Failed to encode summary")?;
        println!("{out}");
        return Ok(());
    }

    let sink = Arc::new(OtelSink::from_settings(&settings).context("Failed to set up OTLP export")?);
    tracing::info!(
        endpoint = %settings.exporter.endpoint,
        service = %settings.service.name,
        "exporting gateway telemetry"
    );
    let dispatcher = EventDispatcher::new(Arc::clone(&sink));
    let replayed = run(&cli, &dispatcher);
    let flushed = sink.shutdown().context("Failed to flush telemetry");
    let stats = replayed?;
    flushed?;

    tracing::info!(
        events = stats.events.dispatched,
        logs = stats.logs.dispatched,
        skipped = stats.events.skipped + stats.logs.skipped,
        leaked_spans = stats.leaked_spans,
        "replay complete"
    );
    Ok(())
}
