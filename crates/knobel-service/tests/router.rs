//! Router-level tests: origin gate, config failure, and input validation run
//! before any upstream call, so none of these need a live provider.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use knobel_service::{router, AppState, Args};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_args(api_key: Option<&str>, origins: &[&str]) -> Args {
    Args {
        listen: "127.0.0.1:0".parse().expect("addr"),
        openrouter_api_key: api_key.map(String::from),
        openrouter_model: "openai/gpt-4o-mini".to_string(),
        openrouter_http_referer: None,
        openrouter_x_title: None,
        allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
        log_level: "info".to_string(),
    }
}

fn weights_request(body: Value, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/weights")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn valid_payload() -> Value {
    json!({
        "question": "¿Salgo a correr?",
        "choices": [{"id": "YES", "label": "Sí"}, {"id": "NO", "label": "No"}]
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(AppState::new(test_args(Some("k"), &[])));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn disallowed_origin_is_rejected_before_anything_else() {
    let app = router(AppState::new(test_args(None, &["https://app.example"])));
    let response = app
        .oneshot(weights_request(valid_payload(), Some("https://evil.example")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({"error": "ORIGIN_FORBIDDEN"}));
}

#[tokio::test]
async fn missing_api_key_is_a_config_error() {
    let app = router(AppState::new(test_args(None, &[])));
    let response = app
        .oneshot(weights_request(valid_payload(), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "CONFIG_OPENROUTER_API_KEY_MISSING"})
    );
}

#[tokio::test]
async fn absent_origin_header_passes_the_gate() {
    // Allow-list configured, no Origin header: the request reaches the next
    // check (here: the missing key), not the origin gate.
    let app = router(AppState::new(test_args(None, &["https://app.example"])));
    let response = app
        .oneshot(weights_request(valid_payload(), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn short_choice_list_is_bad_input() {
    let app = router(AppState::new(test_args(Some("k"), &[])));
    let payload = json!({
        "question": "¿sí?",
        "choices": [{"id": "YES", "label": "Sí"}]
    });
    let response = app
        .oneshot(weights_request(payload, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_body_is_bad_input() {
    let app = router(AppState::new(test_args(Some("k"), &[])));
    let request = Request::builder()
        .method("POST")
        .uri("/api/weights")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid JSON body"}));
}
