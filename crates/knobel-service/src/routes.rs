//! Router, origin gate, and the `/api/weights` handler.

use crate::config::Args;
use crate::error::ApiError;
use crate::prompt::build_messages;
use crate::upstream::OpenRouter;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use knobel_core::{Choice, ChoiceSet, ScoreEntry, MAX_QUESTION_LEN};
use knobel_engine::validate_scoring;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Args>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Args) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    Router::new()
        .route("/api/weights", post(weights))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Preflight responses are scoped to the allow-list; an empty list is the
/// development default and allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    base.allow_origin(AllowOrigin::list(list))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
struct WeightsPayload {
    question: String,
    choices: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub provider: &'static str,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct WeightsResponse {
    pub scores: Vec<ScoreEntry>,
    pub reason: String,
    pub meta: Meta,
}

async fn weights(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<WeightsResponse>, ApiError> {
    check_origin(&headers, &state.config.allowed_origins)?;
    let api_key = state
        .config
        .openrouter_api_key
        .clone()
        .ok_or(ApiError::MissingApiKey)?;
    let Json(raw) = payload.map_err(|_| ApiError::BadInput("Invalid JSON body".to_string()))?;
    let (question, set) = parse_payload(raw)?;

    let upstream = OpenRouter::new(
        state.http.clone(),
        api_key,
        state.config.openrouter_model.clone(),
        state.config.openrouter_http_referer.clone(),
        state.config.openrouter_x_title.clone(),
    );
    let messages = build_messages(&question, &set);
    let raw_scores = upstream.score(&messages).await?;

    // Same rules the client applies on its side of the boundary. A model that
    // scored the wrong id set is rejected even though the transport succeeded.
    let expected = set.ids();
    let result = validate_scoring(&raw_scores, &expected).map_err(|err| {
        tracing::warn!(%err, "model output rejected");
        ApiError::ModelBadJson
    })?;

    Ok(Json(WeightsResponse {
        scores: result.scores,
        reason: result.reason,
        meta: Meta {
            provider: "openrouter",
            model: state.config.openrouter_model.clone(),
        },
    }))
}

/// Requests without an Origin header pass, preserving server-to-server
/// testability; a disallowed Origin is rejected before any upstream work.
fn check_origin(headers: &HeaderMap, allowed: &[String]) -> Result<(), ApiError> {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };
    if allowed.is_empty() {
        return Ok(());
    }
    let origin = origin.to_str().map_err(|_| ApiError::OriginForbidden)?;
    if allowed.iter().any(|a| a == origin) {
        Ok(())
    } else {
        Err(ApiError::OriginForbidden)
    }
}

/// Input-side shape checks, mirroring the validator's rules.
pub fn parse_payload(raw: Value) -> Result<(String, ChoiceSet), ApiError> {
    let payload: WeightsPayload = serde_json::from_value(raw).map_err(|_| {
        ApiError::BadInput("payload must include question and choices".to_string())
    })?;

    let question = payload.question.trim().to_string();
    let question_len = question.chars().count();
    if question_len == 0 || question_len > MAX_QUESTION_LEN {
        return Err(ApiError::BadInput(format!(
            "question must be a non-empty string up to {MAX_QUESTION_LEN} characters"
        )));
    }

    let set = ChoiceSet::new(payload.choices).map_err(|err| ApiError::BadInput(err.to_string()))?;
    Ok((question, set))
}
