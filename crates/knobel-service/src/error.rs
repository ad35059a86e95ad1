//! Closed error taxonomy for the scoring endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed question/choices; the message is shown to the user as-is.
    #[error("{0}")]
    BadInput(String),
    /// Request carried an Origin header outside the allow-list. Rejected
    /// before any upstream call is made.
    #[error("origin not allowed")]
    OriginForbidden,
    /// No OpenRouter credentials configured; fatal for the whole endpoint.
    #[error("OPENROUTER_API_KEY is not configured")]
    MissingApiKey,
    /// Upstream transport failure other than a timeout.
    #[error("upstream model call failed")]
    ModelError,
    /// Upstream answered with a non-2xx status.
    #[error("upstream model API rejected the call")]
    ModelApiError,
    /// The model's output failed shape/range validation; never partially
    /// accepted.
    #[error("model output is not a valid scoring")]
    ModelBadJson,
    /// Upstream call exceeded the 10 s hard timeout.
    #[error("upstream model call timed out")]
    ModelTimeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::OriginForbidden => StatusCode::FORBIDDEN,
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ModelError | Self::ModelApiError | Self::ModelBadJson => StatusCode::BAD_GATEWAY,
            Self::ModelTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// The `error` field of the JSON body. Input errors carry their
    /// human-readable message; everything else is a fixed wire code.
    pub fn wire_error(&self) -> String {
        match self {
            Self::BadInput(msg) => msg.clone(),
            Self::OriginForbidden => "ORIGIN_FORBIDDEN".to_string(),
            Self::MissingApiKey => "CONFIG_OPENROUTER_API_KEY_MISSING".to_string(),
            Self::ModelError => "MODEL_ERROR".to_string(),
            Self::ModelApiError => "MODEL_API_ERROR".to_string(),
            Self::ModelBadJson => "MODEL_BAD_JSON".to_string(),
            Self::ModelTimeout => "MODEL_TIMEOUT".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.wire_error() }))).into_response()
    }
}
