//! Shape validation for raw scoring responses.
//!
//! Turns an untrusted `serde_json::Value` into a [`ScoringResult`], or proves
//! it malformed. The rules are identical on the service and the client; the
//! client must never trust the server's validation alone.

use knobel_core::{ScoreEntry, ScoringResult, MAX_ID_LEN, MAX_REASON_LEN};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Why a raw response is not a well-formed scoring of the expected ids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("response is not a JSON object")]
    NotObject,
    #[error("`scores` is missing or not an array")]
    ScoresMissing,
    #[error("expected {expected} score entries, got {got}")]
    WrongCount { expected: usize, got: usize },
    #[error("score entry {0} is not an object")]
    EntryNotObject(usize),
    #[error("score entry {0} has no valid id (string, 1-{MAX_ID_LEN} chars)")]
    BadId(usize),
    #[error("score entry {0} has no integer score in 0..=100")]
    BadScore(usize),
    #[error("duplicate score id: {0}")]
    DuplicateId(String),
    #[error("score ids do not match the requested choice ids")]
    IdMismatch,
    #[error("`reason` is missing or not a string")]
    ReasonMissing,
    #[error("`reason` must be a single line of 1-{MAX_REASON_LEN} chars")]
    BadReason,
}

impl ShapeError {
    /// Wire code shared by every shape failure.
    pub fn code(&self) -> &'static str {
        "MODEL_BAD_JSON"
    }
}

/// Validates `raw` as a complete, bounded scoring of exactly `expected_ids`.
///
/// On success the scores keep the provider's order and the reason is trimmed.
/// Order of the ids may differ from `expected_ids`; the sets must be equal.
pub fn validate_scoring(raw: &Value, expected_ids: &[&str]) -> Result<ScoringResult, ShapeError> {
    let obj = raw.as_object().ok_or(ShapeError::NotObject)?;
    let scores = obj
        .get("scores")
        .and_then(Value::as_array)
        .ok_or(ShapeError::ScoresMissing)?;
    if scores.len() != expected_ids.len() {
        return Err(ShapeError::WrongCount {
            expected: expected_ids.len(),
            got: scores.len(),
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(scores.len());
    let mut entries = Vec::with_capacity(scores.len());
    for (idx, entry) in scores.iter().enumerate() {
        let entry = entry.as_object().ok_or(ShapeError::EntryNotObject(idx))?;
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .ok_or(ShapeError::BadId(idx))?;
        let id_len = id.trim().chars().count();
        if id_len == 0 || id_len > MAX_ID_LEN {
            return Err(ShapeError::BadId(idx));
        }
        let score = entry
            .get("score")
            .and_then(Value::as_i64)
            .ok_or(ShapeError::BadScore(idx))?;
        if !(0..=100).contains(&score) {
            return Err(ShapeError::BadScore(idx));
        }
        if !seen.insert(id) {
            return Err(ShapeError::DuplicateId(id.to_string()));
        }
        entries.push(ScoreEntry {
            id: id.to_string(),
            score,
        });
    }

    let expected: HashSet<&str> = expected_ids.iter().copied().collect();
    if seen != expected {
        return Err(ShapeError::IdMismatch);
    }

    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .ok_or(ShapeError::ReasonMissing)?
        .trim();
    let reason_len = reason.chars().count();
    if reason_len == 0 || reason_len > MAX_REASON_LEN || reason.contains('\n') {
        return Err(ShapeError::BadReason);
    }

    Ok(ScoringResult {
        scores: entries,
        reason: reason.to_string(),
    })
}
