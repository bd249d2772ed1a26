use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use relief_api::{build_app, ServiceConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const RESCUE_CANDIDATES: [&str; 3] = [
    "Rescue team is being dispatched. Stay calm.",
    "Rescuers are on the way. Stay in a safe place.",
    "Help is coming, please keep your phone available for updates.",
];

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

/// Keyword strategy: no artifact, no hosted model, no log files.
fn test_config(responses_path: PathBuf) -> ServiceConfig {
    ServiceConfig {
        bind: "127.0.0.1:0".to_string(),
        responses_path,
        model_path: PathBuf::from("/nonexistent/classifier.json"),
        remote: None,
        log_dir: None,
    }
}

fn app() -> Router {
    build_app(&test_config(data_dir().join("disaster_responses.csv")))
}

fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn landing_page_is_served() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/static/script.js"));
}

#[tokio::test]
async fn rescue_message_resolves_features_and_intent() {
    let response = app()
        .oneshot(chat_request(
            json!({ "message": "Help! Flood in Nainital, need rescue" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "request_rescue");
    assert_eq!(parsed["disaster_type"], "Flood");
    assert_eq!(parsed["location"], "Nainital");
    assert!(RESCUE_CANDIDATES.contains(&parsed["response"].as_str().unwrap()));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "" }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "No message provided" })
    );
}

#[tokio::test]
async fn missing_message_key_is_rejected() {
    let response = app()
        .oneshot(chat_request(json!({ "text": "flood in tehri" }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No message provided");
}

#[tokio::test]
async fn falsy_non_string_messages_are_rejected() {
    let app = app();
    for message in [json!(false), json!(0), json!([]), json!({})] {
        let response = app
            .clone()
            .oneshot(chat_request(json!({ "message": message }).to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "message {message}");
        assert_eq!(json_body(response).await["error"], "No message provided");
    }
}

#[tokio::test]
async fn truthy_non_string_message_is_a_server_error() {
    let response = app()
        .oneshot(chat_request(json!({ "message": 42 }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn long_message_is_answered() {
    let message = format!("{} need rescue in Tehri", "water everywhere ".repeat(5_000));
    let response = app()
        .oneshot(chat_request(json!({ "message": message }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "request_rescue");
    assert_eq!(parsed["location"], "Tehri");
}

#[tokio::test]
async fn oversized_body_is_rejected_as_too_large() {
    let message = "a".repeat(2 * 1024 * 1024);
    let response = app()
        .oneshot(chat_request(json!({ "message": message }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn malformed_body_is_a_server_error() {
    let response = app()
        .oneshot(chat_request("{\"message\": "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn repeated_requests_keep_everything_but_response_text() {
    let app = app();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..40 {
        let response = app
            .clone()
            .oneshot(chat_request(
                json!({ "message": "We are trapped after a cloudburst in Rudraprayag" })
                    .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed = json_body(response).await;
        assert_eq!(parsed["intent"], "request_rescue");
        assert_eq!(parsed["disaster_type"], "Cloudburst");
        assert_eq!(parsed["location"], "Rudraprayag");
        seen.insert(parsed["response"].as_str().unwrap().to_string());
    }

    assert!(seen.len() > 1);
}

#[tokio::test]
async fn builtin_table_is_used_without_a_responses_file() {
    let app = build_app(&test_config(PathBuf::from("/nonexistent/responses.csv")));

    let response = app
        .clone()
        .oneshot(chat_request(
            json!({ "message": "The school roof collapsed in Almora" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // damage_report is not part of the built-in mapping
    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "damage_report");
    assert_eq!(parsed["location"], "Almora");
    assert_eq!(parsed["disaster_type"], "Unknown");
    assert!(relief_core::GENERIC_RESPONSES.contains(&parsed["response"].as_str().unwrap()));

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health = json_body(health).await;
    assert_eq!(health["classifier"], "keywords");
    assert_eq!(health["response_table"], "builtin");
    assert_eq!(health["response_intents"], 7);
    assert_eq!(health["metrics"]["generic_responses_total"], 1);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "any news?" }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .header("x-request-id", "desk-42")
        .body(Body::from(json!({ "message": "flood in pauri" }).to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "desk-42");
}
