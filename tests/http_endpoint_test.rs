//! Wiremock integration tests for [`HttpEndpoint`].
//!
//! Covers the JSON contract with the unified completion route and how
//! transport failures surface through the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hermod::dispatch::{DispatchConfig, Dispatcher};
use hermod::types::{FALLBACK_MODEL, OFFLINE_PROVIDER, TIMEOUT_MODEL};
use hermod::{
    CompletionEndpoint, HermodError, HistoryMessage, HttpEndpoint, Outcome, QueryRequest,
};

/// A typical success body from the unified route.
fn sample_reply() -> serde_json::Value {
    serde_json::json!({
        "content": "APEX OS is an AI operating system.",
        "provider": "groq",
        "model": "llama-3.1-8b-instant",
        "latency": 412.6,
        "tier": 1,
        "requestId": "req-7f3a"
    })
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/ai-unified"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn posts_camel_case_body_and_parses_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ai-unified"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "message": "What is APEX OS?",
            "systemPrompt": "Brief",
            "preferredProvider": "groq",
            "preferredModel": "fast",
            "sessionId": "s-1",
            "history": [{ "role": "user", "content": "hi" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap();
    let request = QueryRequest::new("What is APEX OS?")
        .system_prompt("Brief")
        .preferred_provider("groq")
        .preferred_model("fast")
        .session_id("s-1")
        .history(vec![HistoryMessage::user("hi")]);

    let response = endpoint
        .complete(&request)
        .await
        .expect("request should succeed");

    assert_eq!(response.content, "APEX OS is an AI operating system.");
    assert_eq!(response.provider, "groq");
    assert_eq!(response.model, "llama-3.1-8b-instant");
    assert_eq!(response.latency_ms, 413);
    assert_eq!(response.tier, 1);
    assert_eq!(response.request_id.as_deref(), Some("req-7f3a"));
    assert!(!response.cached);
    assert!(response.attempts.is_none());
}

#[tokio::test]
async fn debug_trace_carries_attempts() {
    let server = MockServer::start().await;

    let mut reply = sample_reply();
    reply["debug"] = serde_json::json!({
        "attempts": [
            { "provider": "vertex-ai", "enabled": true, "healthy": false,
              "success": false, "error": "quota exceeded", "durationMs": 90 },
            { "provider": "groq", "enabled": true, "success": true, "durationMs": 410 }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/api/ai-unified"))
        .and(body_partial_json(serde_json::json!({ "debug": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap();
    let response = endpoint
        .complete(&QueryRequest::new("ping").debug(true))
        .await
        .unwrap();

    let attempts = response.attempts.expect("attempts should be present");
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].provider, "vertex-ai");
    assert_eq!(attempts[0].healthy, Some(false));
    assert_eq!(attempts[0].error.as_deref(), Some("quota exceeded"));
    assert_eq!(attempts[1].duration_ms, Some(410));
    assert!(attempts[1].success);
}

#[tokio::test]
async fn custom_path_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap().path("v2/complete");
    assert!(endpoint.complete(&QueryRequest::new("ping")).await.is_ok());
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(503).set_body_string("All AI providers failed"),
    )
    .await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap();
    let err = endpoint
        .complete(&QueryRequest::new("ping"))
        .await
        .unwrap_err();

    match err {
        HermodError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "All AI providers failed");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_json_error() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "no content field" })),
    )
    .await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap();
    let err = endpoint
        .complete(&QueryRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, HermodError::Json(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_body_is_error() {
    let server = MockServer::start().await;
    mount_reply(&server, ResponseTemplate::new(200)).await;

    let endpoint = HttpEndpoint::new(server.uri()).unwrap();
    let err = endpoint
        .complete(&QueryRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, HermodError::EmptyResponse), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_http_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let endpoint = HttpEndpoint::new("http://127.0.0.1:9").unwrap();
    let err = endpoint
        .complete(&QueryRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, HermodError::Http(_)), "got {err:?}");
}

// ============================================================================
// Through the dispatcher
// ============================================================================

fn dispatcher_for(server: &MockServer, timeout: Duration) -> Dispatcher {
    let endpoint = Arc::new(HttpEndpoint::new(server.uri()).unwrap());
    Dispatcher::new(endpoint, &DispatchConfig::new().timeout(timeout))
}

#[tokio::test]
async fn server_error_becomes_fallback_response() {
    let server = MockServer::start().await;
    mount_reply(&server, ResponseTemplate::new(500)).await;

    let response = dispatcher_for(&server, Duration::from_secs(5))
        .dispatch(&QueryRequest::new("ping"))
        .await;

    assert_eq!(response.provider, OFFLINE_PROVIDER);
    assert_eq!(response.model, FALLBACK_MODEL);
    assert_eq!(response.outcome(), Outcome::Offline);
}

#[tokio::test]
async fn slow_server_becomes_timeout_response() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(sample_reply())
            .set_delay(Duration::from_millis(500)),
    )
    .await;

    let start = std::time::Instant::now();
    let response = dispatcher_for(&server, Duration::from_millis(50))
        .dispatch(&QueryRequest::new("ping"))
        .await;

    assert_eq!(response.provider, OFFLINE_PROVIDER);
    assert_eq!(response.model, TIMEOUT_MODEL);
    assert!(response.latency_ms >= 50);
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn success_round_trips_through_dispatcher() {
    let server = MockServer::start().await;
    mount_reply(&server, ResponseTemplate::new(200).set_body_json(sample_reply())).await;

    let response = dispatcher_for(&server, Duration::from_secs(5))
        .dispatch(&QueryRequest::new("ping"))
        .await;

    assert_eq!(response.outcome(), Outcome::Completed);
    assert_eq!(response.provider, "groq");
}
