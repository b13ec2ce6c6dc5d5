//! Tests for the generative-text client against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use learnshelf::services::generative_client::{normalize_response, GenerativeTextClient};
use learnshelf::types::errors::GenerativeError;
use learnshelf::types::generative::PromptOptions;
use learnshelf::types::settings::GenerativeSettings;

const MODEL: &str = "models/text-bison-001";
const GENERATE_PATH: &str = "/models/text-bison-001:generate";

fn client_for(server: &MockServer, api_key: Option<&str>) -> GenerativeTextClient {
    GenerativeTextClient::new(GenerativeSettings {
        base_url: server.uri(),
        model: MODEL.to_string(),
        api_key: api_key.map(str::to_string),
    })
}

#[tokio::test]
async fn test_candidate_output_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "k-123"))
        .and(body_partial_json(json!({
            "prompt": {"text": "Summarize"},
            "temperature": 0.25,
            "maxOutputTokens": 512
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"output": "hello"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server, Some("k-123"))
        .send_prompt("Summarize", PromptOptions::default())
        .await
        .unwrap();
    assert_eq!(text.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_options_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({"temperature": 0.9, "maxOutputTokens": 64})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let options = PromptOptions {
        temperature: Some(0.9),
        max_output_tokens: Some(64),
    };
    let text = client_for(&server, Some("k"))
        .send_prompt("hi", options)
        .await
        .unwrap();
    assert_eq!(text.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_output_fragments_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [{"content": [{"text": "a"}, {"text": "b"}]}]
        })))
        .mount(&server)
        .await;

    let text = client_for(&server, Some("k"))
        .send_prompt("hi", PromptOptions::default())
        .await
        .unwrap();
    assert_eq!(text.as_deref(), Some("ab"));
}

#[tokio::test]
async fn test_missing_key_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    assert!(!client.has_api_key());
    let text = client.send_prompt("hi", PromptOptions::default()).await.unwrap();
    assert!(text.is_none());

    let empty = client_for(&server, Some(""));
    assert!(empty.send_prompt("hi", PromptOptions::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_error_status_includes_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = client_for(&server, Some("k"))
        .send_prompt("hi", PromptOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerativeError::Api { status: 500, .. }));
    let message = err.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("internal"));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server, Some("k"))
        .send_prompt("hi", PromptOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerativeError::Decode(_)));
}

#[tokio::test]
async fn test_zero_token_budget_is_rejected() {
    let server = MockServer::start().await;
    let options = PromptOptions {
        temperature: None,
        max_output_tokens: Some(0),
    };
    let err = client_for(&server, Some("k"))
        .send_prompt("hi", options)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerativeError::InvalidOptions(_)));
}

#[test]
fn test_unknown_shape_falls_back_to_json() {
    let data = json!({"weird": 1});
    assert_eq!(normalize_response(&data), "{\"weird\":1}");
}

#[test]
fn test_candidate_content_fragments() {
    let data = json!({"candidates": [{"content": [{"text": "x"}, {"text": "y"}]}]});
    assert_eq!(normalize_response(&data), "xy");
}
