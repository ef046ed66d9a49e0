//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use hermod::cache::{CacheConfig, CacheKey, ResponseCache};
use hermod::dispatch::{DispatchConfig, Dispatcher};
use hermod::telemetry;
use hermod::{CompletionEndpoint, Hermod, HermodError, QueryRequest, QueryResponse, Result};

// ============================================================================
// Mock endpoints
// ============================================================================

struct EchoEndpoint {
    delay: Duration,
}

#[async_trait]
impl CompletionEndpoint for EchoEndpoint {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &QueryRequest) -> Result<QueryResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(QueryResponse {
            content: request.message.clone(),
            provider: "groq".into(),
            model: "llama-3.1-8b-instant".into(),
            latency_ms: 1,
            tier: 0,
            cached: false,
            request_id: None,
            attempts: None,
        })
    }
}

struct DownEndpoint;

#[async_trait]
impl CompletionEndpoint for DownEndpoint {
    fn name(&self) -> &str {
        "down"
    }

    async fn complete(&self, _request: &QueryRequest) -> Result<QueryResponse> {
        Err(HermodError::Http("connection refused".into()))
    }
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

/// Counter value for a metric name carrying `label = value`.
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
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn key(message: &str) -> CacheKey {
    CacheKey::derive(&QueryRequest::new(message))
}

fn response(content: &str) -> QueryResponse {
    QueryResponse {
        content: content.into(),
        provider: "groq".into(),
        model: "llama-3.1-8b-instant".into(),
        latency_ms: 5,
        tier: 0,
        cached: false,
        request_id: None,
        attempts: None,
    }
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn cache_records_hits_misses_and_evictions() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let cache = ResponseCache::new(&CacheConfig::new().max_entries(1));
        let minute = Duration::from_secs(60);

        assert!(cache.get(&key("a")).is_none());
        cache.put(key("a"), response("a"), minute);
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("a")).is_some());
        cache.put(key("b"), response("b"), minute);
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_EVICTIONS_TOTAL), 1);
}

#[test]
fn contains_records_nothing() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let cache = ResponseCache::new(&CacheConfig::default());
        cache.contains(&key("a"));
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 0);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 0);
}

// ============================================================================
// Dispatch
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn dispatch_records_outcome_and_duration() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let ok = Dispatcher::new(
                    Arc::new(EchoEndpoint {
                        delay: Duration::ZERO,
                    }),
                    &DispatchConfig::default(),
                );
                ok.dispatch(&QueryRequest::new("ping")).await;

                let down = Dispatcher::new(Arc::new(DownEndpoint), &DispatchConfig::default());
                down.dispatch(&QueryRequest::new("ping")).await;

                let slow = Dispatcher::new(
                    Arc::new(EchoEndpoint {
                        delay: Duration::from_secs(5),
                    }),
                    &DispatchConfig::new().timeout(Duration::from_millis(20)),
                );
                slow.dispatch(&QueryRequest::new("ping")).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::DISPATCH_TOTAL), 3);
    for outcome in ["ok", "offline", "timeout"] {
        assert_eq!(
            counter_with_label(&snapshot, telemetry::DISPATCH_TOTAL, "outcome", outcome),
            1,
            "expected one {outcome} dispatch"
        );
    }
    assert!(has_histogram(&snapshot, telemetry::DISPATCH_DURATION_SECONDS));
}

// ============================================================================
// Facade
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn facade_records_dedup_joins() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = Hermod::builder()
                    .endpoint(Arc::new(EchoEndpoint {
                        delay: Duration::from_millis(50),
                    }))
                    .build()
                    .unwrap();
                let request = QueryRequest::new("ping");

                futures_util::future::join_all((0..3).map(|_| gateway.query(&request))).await;
                gateway.query(&request).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::DEDUP_JOINS_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 3);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn prefetch_records_outcomes() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = Hermod::builder()
                    .endpoint(Arc::new(DownEndpoint))
                    .build()
                    .unwrap();
                gateway
                    .warm(&[QueryRequest::new("a"), QueryRequest::new("b")])
                    .await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::PREFETCH_TOTAL, "outcome", "offline"),
        2
    );
}
