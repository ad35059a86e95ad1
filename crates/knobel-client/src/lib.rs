//! HTTP client for the scoring service.
//!
//! Posts `{question, choices}` to `/api/weights`, enforces the request
//! timeout, and maps every failure into a closed taxonomy. The response body
//! is re-validated locally even though the service already validated it; an
//! intermediary or a future server bug must not be able to smuggle a
//! malformed weighting past the sampler.
//!
//! A failed attempt is terminal for the user action: there is no automatic
//! retry anywhere in this crate.

use knobel_core::{Choice, ChoiceSet, ScoringResult, MAX_QUESTION_LEN};
use knobel_engine::validate_scoring;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Provider-side hard timeout is 10 s; any non-response beyond that is
/// `MODEL_TIMEOUT` on this side too.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("question must be 1-{MAX_QUESTION_LEN} chars")]
    BadQuestion,
    #[error("scoring service rejected the request: {code}")]
    Api { code: String },
    #[error("scoring service returned HTTP {status}")]
    Http { status: u16 },
    #[error("scoring request timed out")]
    ModelTimeout,
    #[error("scoring response failed shape validation")]
    ModelBadJson,
    #[error("transport failure")]
    Transport(#[source] reqwest::Error),
}

impl WeightsError {
    /// The wire code for this failure, as shown to the user and recorded in
    /// status messages.
    pub fn code(&self) -> String {
        match self {
            Self::BadQuestion => "BAD_INPUT".to_string(),
            Self::Api { code } => code.clone(),
            Self::Http { status } => format!("HTTP_{status}"),
            Self::ModelTimeout => "MODEL_TIMEOUT".to_string(),
            Self::ModelBadJson => "MODEL_BAD_JSON".to_string(),
            Self::Transport(_) => "MODEL_ERROR".to_string(),
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ModelTimeout
        } else {
            Self::Transport(err)
        }
    }
}

/// User-facing message for a wire code.
pub fn describe(code: &str) -> String {
    match code {
        "MODEL_BAD_JSON" => "La IA no devolvió JSON válido (MODEL_BAD_JSON).".to_string(),
        "MODEL_TIMEOUT" => "La petición a la IA tardó demasiado (MODEL_TIMEOUT).".to_string(),
        other => format!("No se pudieron obtener pesos ({other})."),
    }
}

#[derive(Serialize)]
struct WeightsRequest<'a> {
    question: &'a str,
    choices: &'a [Choice],
}

pub struct WeightsClient {
    base_url: String,
    http: reqwest::Client,
}

impl WeightsClient {
    pub fn new(base_url: &str) -> Result<Self, WeightsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(WeightsError::Transport)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Requests one score per choice plus a short rationale.
    pub async fn request_scores(
        &self,
        question: &str,
        choices: &ChoiceSet,
    ) -> Result<ScoringResult, WeightsError> {
        let question = question.trim();
        let question_len = question.chars().count();
        if question_len == 0 || question_len > MAX_QUESTION_LEN {
            return Err(WeightsError::BadQuestion);
        }

        let response = self
            .http
            .post(format!("{}/api/weights", self.base_url))
            .json(&WeightsRequest {
                question,
                choices: choices.choices(),
            })
            .send()
            .await
            .map_err(WeightsError::from_reqwest)?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();
        map_response(status, body, &choices.ids())
    }
}

/// Maps `(status, body)` to the error taxonomy or a validated result.
///
/// Pure so the taxonomy is testable without a live server: structured error
/// bodies win over raw statuses, and a 2xx body still has to pass the full
/// shape validation against the ids this client sent.
pub fn map_response(
    status: u16,
    body: Option<Value>,
    expected_ids: &[&str],
) -> Result<ScoringResult, WeightsError> {
    if !(200..300).contains(&status) {
        if let Some(code) = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
        {
            return Err(WeightsError::Api {
                code: code.to_string(),
            });
        }
        return Err(WeightsError::Http { status });
    }
    let body = body.ok_or(WeightsError::ModelBadJson)?;
    validate_scoring(&body, expected_ids).map_err(|_| WeightsError::ModelBadJson)
}
