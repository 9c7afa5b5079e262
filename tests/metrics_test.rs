//! Tests for metrics emitted by the dispatch engine.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;

use charla::telemetry;
use charla::{
    Availability, Catalog, DispatchEngine, HttpRequest, HttpResponse, Picker, Provider, Result,
    Transport, Turn,
};

// ============================================================================
// Mocks
// ============================================================================

struct FirstPicker;

impl Picker for FirstPicker {
    fn pick_index(&self, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }
}

/// Provider "bad" is down, everything else answers.
struct HalfDownTransport;

#[async_trait]
impl Transport for HalfDownTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if request.url.ends_with("bad") {
            Ok(HttpResponse::new(503, "unavailable"))
        } else {
            Ok(HttpResponse::new(
                200,
                json!({"choices": [{"message": {"content": "ok"}}]}).to_string(),
            ))
        }
    }
}

fn engine(ids: &[&str]) -> DispatchEngine {
    let providers = ids
        .iter()
        .map(|id| Provider::chat_completions(*id, format!("http://{id}"), "m", "KEY"))
        .collect();
    let creds = HashMap::from([("KEY".to_string(), "secret".to_string())]);
    let availability = Availability::resolve(&Catalog::new(providers), &creds).unwrap();
    DispatchEngine::builder(Arc::new(availability))
        .transport(Arc::new(HalfDownTransport))
        .picker(Arc::new(FirstPicker))
        .build()
        .unwrap()
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for `name` carrying label `label=value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Run one turn under a local recorder and return the snapshot.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the turn.
fn record_turn(engine: &DispatchEngine) -> (Turn, SnapshotVec) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let turn = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let mut session = engine.new_session();
                engine.respond(&mut session, "hola").await
            })
        })
    });

    (turn, snapshotter.snapshot().into_vec())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_turn_records_metrics() {
    let (turn, snapshot) = record_turn(&engine(&["good"]));
    assert!(turn.is_success());

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::TURNS_TOTAL, "outcome", "ok"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 0);
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn fallback_records_each_attempt() {
    let (turn, snapshot) = record_turn(&engine(&["bad", "good"]));
    assert!(turn.is_success());

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "connection"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_EXHAUSTED_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn exhausted_fallback_is_counted() {
    let (turn, snapshot) = record_turn(&engine(&["bad"]));
    assert!(!turn.is_success());

    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_EXHAUSTED_TOTAL), 1);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::TURNS_TOTAL, "outcome", "connection"),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let engine = engine(&["good"]);
    let mut session = engine.new_session();
    let turn = engine.respond(&mut session, "hola").await;
    assert!(turn.is_success());
}
