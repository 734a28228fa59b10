//! Event sequences driven through the dispatcher into both sinks.

use std::sync::Arc;

use janus_otel_core::{AttrValue, LogLine, Severity};
use janus_otel_settings::JanusOtelSettings;
use janus_otel_telemetry::{
    BASE_EVENT_NAME, EventDispatcher, OtelSink, RecordingSink, STATS_EVENT_NAME, SessionSpan,
};
use opentelemetry::Value;
use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use serde_json::json;

fn recording() -> (Arc<RecordingSink>, EventDispatcher<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (Arc::clone(&sink), EventDispatcher::new(sink))
}

// ── session lifecycle ───────────────────────────────────────────────────────

#[test]
fn created_then_destroyed_then_reacquired() {
    let (sink, dispatcher) = recording();

    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 42, "event": {"name": "created"}})));
    let first = dispatcher.spans().span_key(42).unwrap();
    assert_eq!(sink.spans_for(42).len(), 1);
    assert!(!sink.span(first).unwrap().ended());

    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 42, "event": {"name": "destroyed"}})));
    let closed = sink.span(first).unwrap();
    assert_eq!(closed.event_names(), [BASE_EVENT_NAME, BASE_EVENT_NAME]);
    assert_eq!(
        closed.events[1].attributes.get("event"),
        Some(&AttrValue::from(r#"{"name":"destroyed"}"#))
    );
    assert_eq!(closed.end_count, 1);
    assert!(!dispatcher.spans().contains(42));

    let second = dispatcher.spans().acquire(42).id();
    assert_ne!(first, second);
    assert_eq!(sink.spans_for(42).len(), 2);
}

// ── media statistics ────────────────────────────────────────────────────────

#[test]
fn media_event_gets_flattened_stats() {
    let (sink, dispatcher) = recording();
    dispatcher.dispatch(Some(&json!({"type": 32, "session_id": 7, "event": {"bitrate": 1500, "nacks": 0}})));

    let spans = sink.spans_for(7);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].event_names(), [BASE_EVENT_NAME, STATS_EVENT_NAME]);

    let base = &spans[0].events[0].attributes;
    assert_eq!(base.get("event"), Some(&AttrValue::from(r#"{"bitrate":1500,"nacks":0}"#)));

    let stats = &spans[0].events[1].attributes;
    assert_eq!(stats.get("bitrate"), Some(&AttrValue::UInt(1500)));
    assert_eq!(stats.get("nacks"), Some(&AttrValue::UInt(0)));
    assert!(!stats.contains_key("event"));
    assert!(!spans[0].ended());
}

// ── leaks ───────────────────────────────────────────────────────────────────

#[test]
fn sessions_without_destroyed_stay_open_until_shutdown() {
    let (sink, dispatcher) = recording();
    for session in 1..=3 {
        dispatcher.dispatch(Some(&json!({"type": 1, "session_id": session, "event": {"name": "created"}})));
        dispatcher.dispatch(Some(&json!({"type": 32, "session_id": session, "event": {"lost": 1}})));
    }
    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 2, "event": {"name": "destroyed"}})));

    assert_eq!(dispatcher.spans().len(), 2);
    assert!(dispatcher.spans().contains(1));
    assert!(dispatcher.spans().contains(3));
    assert!(sink.spans_for(1).iter().all(|s| !s.ended()));

    assert_eq!(dispatcher.shutdown(), 2);
    assert!(dispatcher.spans().is_empty());
    assert!(sink.spans().iter().all(|s| s.end_count == 1));
}

#[test]
fn double_destroyed_is_harmless() {
    let (sink, dispatcher) = recording();
    let destroyed = json!({"type": 1, "session_id": 9, "event": {"name": "destroyed"}});
    dispatcher.dispatch(Some(&destroyed));
    dispatcher.dispatch(Some(&destroyed));

    let spans = sink.spans_for(9);
    assert_eq!(spans.len(), 2);
    assert!(spans.iter().all(|s| s.end_count == 1 && s.events.len() == 1));
    assert!(dispatcher.spans().is_empty());
}

// ── concurrency ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_sessions_each_get_one_span() {
    const THREADS: u64 = 8;
    const SESSIONS_PER_THREAD: u64 = 25;

    let (sink, dispatcher) = recording();
    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let dispatcher = &dispatcher;
            let _ = scope.spawn(move || {
                for n in 0..SESSIONS_PER_THREAD {
                    let session = thread * 1_000 + n;
                    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": session, "event": {"name": "created"}})));
                    dispatcher.dispatch(Some(&json!({"type": 32, "session_id": session, "event": {"bitrate": n}})));
                    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": session, "event": {"name": "destroyed"}})));
                }
            });
        }
    });

    let spans = sink.spans();
    assert_eq!(spans.len(), usize::try_from(THREADS * SESSIONS_PER_THREAD).unwrap());
    for span in &spans {
        assert_eq!(
            span.event_names(),
            [BASE_EVENT_NAME, BASE_EVENT_NAME, STATS_EVENT_NAME, BASE_EVENT_NAME]
        );
        assert_eq!(span.end_count, 1);
    }
    assert!(dispatcher.spans().is_empty());
}

#[test]
fn concurrent_events_on_one_session_share_a_span() {
    let (sink, dispatcher) = recording();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let dispatcher = &dispatcher;
            let _ = scope.spawn(move || {
                for _ in 0..50 {
                    dispatcher.dispatch(Some(&json!({"type": 2, "session_id": 5})));
                }
            });
        }
    });

    let spans = sink.spans_for(5);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].events.len(), 200);
}

#[test]
fn concurrent_lifecycles_on_one_session_end_only_destroyed_spans() {
    let (sink, dispatcher) = recording();
    std::thread::scope(|scope| {
        for name in ["created", "destroyed", "created", "destroyed"] {
            let dispatcher = &dispatcher;
            let _ = scope.spawn(move || {
                for _ in 0..100 {
                    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 42, "event": {"name": name}})));
                }
            });
        }
    });

    let open = dispatcher.spans().span_key(42);
    let destroyed = AttrValue::from(r#"{"name":"destroyed"}"#);
    for span in sink.spans_for(42) {
        if Some(span.key) == open {
            assert!(!span.ended());
            continue;
        }
        assert_eq!(span.end_count, 1);
        let last = span.events.last().unwrap();
        assert_eq!(last.attributes.get("event"), Some(&destroyed));
    }
    assert_eq!(dispatcher.shutdown(), usize::from(open.is_some()));
}

// ── OpenTelemetry export ────────────────────────────────────────────────────

#[test]
fn otel_pipeline_exports_session_span_and_logs() {
    let span_exporter = InMemorySpanExporter::default();
    let log_exporter = InMemoryLogExporter::default();
    let sink = Arc::new(OtelSink::new(
        SdkTracerProvider::builder()
            .with_simple_exporter(span_exporter.clone())
            .build(),
        SdkLoggerProvider::builder()
            .with_simple_exporter(log_exporter.clone())
            .build(),
        &JanusOtelSettings::default(),
    ));
    let dispatcher = EventDispatcher::new(Arc::clone(&sink));

    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 42, "event": {"name": "created"}})));
    dispatcher.dispatch(Some(&json!({"type": 32, "session_id": 42, "event": {"bitrate": 1500, "nacks": 0}})));
    assert!(span_exporter.get_finished_spans().unwrap().is_empty());
    dispatcher.dispatch(Some(&json!({"type": 1, "session_id": 42, "event": {"name": "destroyed"}})));
    dispatcher.log_line(&LogLine {
        timestamp: 1,
        line: "W|slow link".to_owned(),
        tid: 2,
    });

    let spans = span_exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    let names: Vec<&str> = spans[0].events.events.iter().map(|e| e.name.as_ref()).collect();
    assert_eq!(names, [BASE_EVENT_NAME, BASE_EVENT_NAME, STATS_EVENT_NAME, BASE_EVENT_NAME]);

    let stats = &spans[0].events.events[2].attributes;
    let bitrate = stats.iter().find(|kv| kv.key.as_str() == "bitrate").map(|kv| &kv.value);
    assert_eq!(bitrate, Some(&Value::I64(1500)));
    assert!(stats.iter().all(|kv| kv.key.as_str() != "event"));

    let logs = log_exporter.get_emitted_logs().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].record.severity_text(), Some(Severity::Warn.as_str()));

    assert_eq!(dispatcher.shutdown(), 0);
    sink.shutdown().unwrap();
}
