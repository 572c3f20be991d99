//! Models endpoint integration tests
//!
//! Tests for:
//! - GET /{version}/models - Model list relay
//! - GET /{version}/models/{model} - Model info relay

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use crate::common::{api_key_header, constants, TestHarness};
use crate::mocks::GeminiTestData;

#[tokio::test]
async fn test_list_models_is_relayed_for_both_namespaces() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;

    for version in ["v1", "v1beta"] {
        let (name, value) = api_key_header(constants::TEST_HEADER_KEY);
        let response = harness
            .server
            .get(&format!("/{version}/models"))
            .add_header(name, value)
            .await;

        response.assert_status_ok();
        let json: Value = response.json();
        assert_eq!(json, GeminiTestData::model_list());
    }

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.method.as_str(), "GET");
        assert_eq!(request.url.path(), "/v1/models");
    }
}

#[tokio::test]
async fn test_get_model_is_relayed() {
    let harness = TestHarness::new().await;
    harness
        .gemini
        .mock_get_model("gemini-1.5-flash", GeminiTestData::model_info("gemini-1.5-flash"))
        .await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    let response = harness
        .server
        .get("/v1beta/models/gemini-1.5-flash")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["name"], "models/gemini-1.5-flash");

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests[0].url.path(), "/v1/models/gemini-1.5-flash");
}

#[tokio::test]
async fn test_get_unknown_model_relays_404() {
    let harness = TestHarness::new().await;
    harness
        .gemini
        .mock_error(
            "GET",
            "/v1/models/no-such-model",
            404,
            r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#,
        )
        .await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    let response = harness
        .server
        .get("/v1/models/no-such-model")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["detail"], r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#);
}

#[tokio::test]
async fn test_list_models_rate_limit_is_relayed() {
    let harness = TestHarness::new().await;
    harness
        .gemini
        .mock_error("GET", "/v1/models", 429, r#"{"error":"rate limited"}"#)
        .await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    let response = harness
        .server
        .get("/v1/models")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let json: Value = response.json();
    assert_eq!(json["detail"], r#"{"error":"rate limited"}"#);
}

#[tokio::test]
async fn test_unknown_namespace_is_not_routed() {
    let harness = TestHarness::new().await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    harness
        .server
        .get("/v2/models")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(harness.gemini.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_list_models_body_is_relayed_byte_for_byte() {
    let harness = TestHarness::new().await;
    let raw = r#"{"zeta":1,"alpha":2,"models":[{"name":"models/b"},{"name":"models/a"}]}"#;
    harness.gemini.mock_list_models_raw(raw).await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    let response = harness
        .server
        .get("/v1/models")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(response.text(), raw);
}

#[tokio::test]
async fn test_encoded_slash_in_model_stays_one_segment() {
    let harness = TestHarness::new().await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    harness
        .server
        .get("/v1/models/tuned%2Fx")
        .add_header(name, value)
        .await;

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/v1/models/tuned%2Fx");
}

#[tokio::test]
async fn test_dot_segment_model_is_not_forwarded() {
    let harness = TestHarness::new().await;

    let request = Request::builder()
        .uri("/v1/models/%2E%2E")
        .header("x-api-key", constants::TEST_HEADER_KEY)
        .body(Body::empty())
        .unwrap();
    let response = harness.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(harness.gemini.received_requests().await.is_empty());
}
