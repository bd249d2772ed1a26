mod config;
mod error;

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use relief_agents::ReliefResponder;
use relief_core::{ResponseTable, TableSource};
use relief_ml::IntentClassifier;
use relief_observability::AppMetrics;
use serde::Serialize;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use config::ServiceConfig;
pub use error::{ChatError, ErrorBody, INTERNAL_ERROR, NO_MESSAGE, TOO_LARGE};

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub responder: ReliefResponder,
    pub metrics: Arc<AppMetrics>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub intent: String,
    pub disaster_type: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    classifier: &'static str,
    response_table: &'static str,
    response_intents: usize,
    metrics: relief_observability::MetricsSnapshot,
}

/// Loads the response table and picks the classifier strategy once; both stay
/// read-only for the life of the process.
pub fn build_app(config: &ServiceConfig) -> Router {
    let metrics = AppMetrics::shared();
    let responses = Arc::new(ResponseTable::load_or_builtin(&config.responses_path));
    let classifier = Arc::new(IntentClassifier::select(&config.classifier_settings()));

    info!(
        classifier = classifier.strategy_name(),
        response_intents = responses.len(),
        "relief responder ready"
    );

    let responder = ReliefResponder::new(classifier, responses, metrics.clone());
    build_router(ApiState { responder, metrics })
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/script.js", get(script))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript; charset=utf-8"),
        )],
        SCRIPT_JS,
    )
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let responses = state.responder.responses();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        classifier: state.responder.classifier().strategy_name(),
        response_table: match responses.source() {
            TableSource::File => "file",
            TableSource::Builtin => "builtin",
        },
        response_intents: responses.len(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let message = match extract_message(payload) {
        Ok(message) => message,
        Err(ChatError::MissingMessage) => {
            state.metrics.inc_rejected();
            warn!(request_id = %request_id, "chat request without message");
            return Err(ChatError::MissingMessage);
        }
        Err(ChatError::TooLarge) => {
            state.metrics.inc_rejected();
            warn!(request_id = %request_id, limit = MAX_BODY_BYTES, "chat request body too large");
            return Err(ChatError::TooLarge);
        }
        Err(err) => {
            state.metrics.inc_failure();
            error!(request_id = %request_id, error = %err, "error processing message");
            return Err(err);
        }
    };

    info!(request_id = %request_id, message = %message, "user message");

    let result = state.responder.respond(&message).await;

    info!(
        request_id = %request_id,
        response = %result.response,
        intent = %result.intent,
        disaster_type = %result.disaster_type,
        location = %result.location,
        "bot response"
    );

    Ok(Json(ChatResponse {
        response: result.response,
        intent: result.intent.to_string(),
        disaster_type: result.disaster_type,
        location: result.location,
    }))
}

/// A missing or falsy `message` (`null`, `false`, `0`, `""`, `[]`, `{}`) is a
/// client error, as is an oversized body. Anything else that is not a JSON
/// object with a string `message` is a server failure.
fn extract_message(payload: Result<Json<Value>, JsonRejection>) -> Result<String, ChatError> {
    let Json(body) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ChatError::TooLarge
        } else {
            ChatError::InvalidBody(rejection.body_text())
        }
    })?;

    let Some(fields) = body.as_object() else {
        return Err(ChatError::InvalidBody(format!("expected a JSON object, got {body}")));
    };

    match fields.get("message") {
        None => Err(ChatError::MissingMessage),
        Some(value) if is_falsy(value) => Err(ChatError::MissingMessage),
        Some(Value::String(message)) => Ok(message.clone()),
        Some(other) => Err(ChatError::InvalidMessage(other.to_string())),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(detail = %detail, "request handler panicked");
    ChatError::Internal(detail).into_response()
}

async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}
