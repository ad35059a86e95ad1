//! OpenRouter upstream call and output extraction.

use crate::error::ApiError;
use crate::prompt::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
/// Hard ceiling on the upstream call; beyond it the request is MODEL_TIMEOUT.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TOKENS: u32 = 220;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenRouter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouter {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        model: String,
        referer: Option<String>,
        title: Option<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            model,
            referer,
            title,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls the model and returns its output parsed as JSON, after stripping
    /// an optional single code fence. Performs no other repair.
    pub async fn score(&self, messages: &[ChatMessage]) -> Result<Value, ApiError> {
        let mut request = self
            .http
            .post(OPENROUTER_URL)
            .timeout(UPSTREAM_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                temperature: 0.0,
                max_tokens: MAX_TOKENS,
            });
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            request = request.header("X-Title", title);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::ModelTimeout
            } else {
                ApiError::ModelError
            }
        })?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "openrouter rejected the call");
            return Err(ApiError::ModelApiError);
        }

        let payload: ChatResponse = response.json().await.map_err(|_| ApiError::ModelError)?;
        let content = payload
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or(ApiError::ModelBadJson)?;

        serde_json::from_str(strip_code_fence(content)).map_err(|_| ApiError::ModelBadJson)
    }
}

/// Strips one fenced code block (``` or ```json) around the model's raw
/// text. Anything else is returned trimmed and unchanged; malformed JSON
/// after stripping stays the caller's problem.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the end of the first line.
    let Some(newline) = rest.find('\n') else {
        return trimmed;
    };
    let Some(inner) = rest[newline + 1..].strip_suffix("```") else {
        return trimmed;
    };
    inner.trim()
}
