//! API key resolution integration tests
//!
//! Every relayed endpoint requires a key in `X-API-Key` or `api_key`; the
//! header wins when both are present.

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::{api_key_header, constants, TestHarness};
use crate::mocks::{GeminiTestData, MockGemini};

fn assert_names_both_locations(json: &Value) {
    let detail = json["detail"].as_str().expect("detail should be a string");
    assert!(detail.contains("X-API-Key"), "detail should name the header: {detail}");
    assert!(detail.contains("api_key"), "detail should name the query param: {detail}");
}

#[tokio::test]
async fn test_missing_key_is_rejected_on_every_endpoint() {
    let harness = TestHarness::new().await;
    let body = GeminiTestData::generate_request("hi");

    for version in ["v1", "v1beta"] {
        let responses = [
            harness.server.get(&format!("/{version}/models")).await,
            harness
                .server
                .get(&format!("/{version}/models/gemini-pro"))
                .await,
            harness
                .server
                .post(&format!("/{version}/models/gemini-pro:generateContent"))
                .json(&body)
                .await,
            harness
                .server
                .post(&format!("/{version}/models/gemini-pro:streamGenerateContent"))
                .json(&body)
                .await,
        ];

        for response in responses {
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_names_both_locations(&response.json());
        }
    }

    assert!(
        harness.gemini.received_requests().await.is_empty(),
        "Unauthenticated requests must not reach the upstream"
    );
}

#[tokio::test]
async fn test_empty_header_and_query_are_rejected() {
    let harness = TestHarness::new().await;
    let (name, value) = api_key_header("");

    let response = harness
        .server
        .get("/v1/models")
        .add_header(name, value)
        .add_query_param("api_key", "")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_names_both_locations(&response.json());
}

#[tokio::test]
async fn test_header_key_is_forwarded() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    harness
        .server
        .get("/v1/models")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        MockGemini::upstream_key(&requests[0]).as_deref(),
        Some(constants::TEST_HEADER_KEY)
    );
}

#[tokio::test]
async fn test_query_key_is_forwarded() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;

    harness
        .server
        .get("/v1beta/models")
        .add_query_param("api_key", constants::TEST_QUERY_KEY)
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        MockGemini::upstream_key(&requests[0]).as_deref(),
        Some(constants::TEST_QUERY_KEY)
    );
}

#[tokio::test]
async fn test_header_key_wins_over_query_key() {
    let harness = TestHarness::new().await;
    harness
        .gemini
        .mock_get_model(constants::TEST_MODEL, GeminiTestData::model_info(constants::TEST_MODEL))
        .await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    harness
        .server
        .get("/v1/models/gemini-pro")
        .add_header(name, value)
        .add_query_param("api_key", constants::TEST_QUERY_KEY)
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        MockGemini::upstream_key(&requests[0]).as_deref(),
        Some(constants::TEST_HEADER_KEY)
    );
}

#[tokio::test]
async fn test_caller_query_key_is_not_forwarded_as_is() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;

    harness
        .server
        .get("/v1/models")
        .add_query_param("api_key", constants::TEST_QUERY_KEY)
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    let pairs: Vec<(String, String)> = requests[0].url.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![("key".to_string(), constants::TEST_QUERY_KEY.to_string())]
    );
}

#[tokio::test]
async fn test_repeated_query_key_does_not_block_header_key() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;
    let (name, value) = api_key_header(constants::TEST_HEADER_KEY);

    harness
        .server
        .get("/v1/models")
        .add_query_param("api_key", "first")
        .add_query_param("api_key", "second")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        MockGemini::upstream_key(&requests[0]).as_deref(),
        Some(constants::TEST_HEADER_KEY)
    );
}

#[tokio::test]
async fn test_repeated_query_key_uses_last_value() {
    let harness = TestHarness::new().await;
    harness.gemini.mock_list_models(GeminiTestData::model_list()).await;

    harness
        .server
        .get("/v1beta/models")
        .add_query_param("api_key", "first")
        .add_query_param("api_key", "second")
        .await
        .assert_status_ok();

    let requests = harness.gemini.received_requests().await;
    assert_eq!(
        MockGemini::upstream_key(&requests[0]).as_deref(),
        Some("second")
    );
}
