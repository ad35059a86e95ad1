//! Core types for the knobel decision engine.
//!
//! A decision round starts from a [`ChoiceSet`] (binary yes/no, die faces, or
//! a user-defined list), optionally passes through the AI weighting path, and
//! ends as one chosen [`Choice`] plus a [`HistoryEntry`] for the record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod storage;

/// Bounds shared by both sides of the scoring boundary.
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 12;
pub const MAX_ID_LEN: usize = 50;
pub const MAX_LABEL_LEN: usize = 50;
pub const MAX_QUESTION_LEN: usize = 1000;
pub const MAX_REASON_LEN: usize = 300;

/// One candidate option in a decision round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ordered set of 2–12 choices with unique, non-empty ids.
///
/// The constructor is the only way to build one, so downstream code can rely
/// on the bounds without re-checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChoiceSet(Vec<Choice>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceSetError {
    #[error("a decision needs at least {MIN_CHOICES} choices, got {0}")]
    TooFew(usize),
    #[error("at most {MAX_CHOICES} choices are allowed, got {0}")]
    TooMany(usize),
    #[error("choice {0} has an empty or over-long id (1-{MAX_ID_LEN} chars)")]
    BadId(usize),
    #[error("choice {0} has an empty or over-long label (1-{MAX_LABEL_LEN} chars)")]
    BadLabel(usize),
    #[error("duplicate choice id: {0}")]
    DuplicateId(String),
}

impl ChoiceSet {
    pub fn new(choices: Vec<Choice>) -> Result<Self, ChoiceSetError> {
        if choices.len() < MIN_CHOICES {
            return Err(ChoiceSetError::TooFew(choices.len()));
        }
        if choices.len() > MAX_CHOICES {
            return Err(ChoiceSetError::TooMany(choices.len()));
        }
        let mut trimmed = Vec::with_capacity(choices.len());
        for (idx, choice) in choices.into_iter().enumerate() {
            let id = choice.id.trim().to_string();
            let label = choice.label.trim().to_string();
            if id.is_empty() || id.chars().count() > MAX_ID_LEN {
                return Err(ChoiceSetError::BadId(idx));
            }
            if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
                return Err(ChoiceSetError::BadLabel(idx));
            }
            if trimmed.iter().any(|c: &Choice| c.id == id) {
                return Err(ChoiceSetError::DuplicateId(id));
            }
            trimmed.push(Choice { id, label });
        }
        Ok(Self(trimmed))
    }

    /// The fixed yes/no pair used by the binary modes.
    pub fn binary() -> Self {
        Self(vec![Choice::new("YES", "sí"), Choice::new("NO", "no")])
    }

    /// Six die faces.
    pub fn dice() -> Self {
        Self(
            (1..=6)
                .map(|n| Choice::new(format!("D{n}"), n.to_string()))
                .collect(),
        )
    }

    /// Builds a set from plain list items; ids follow the `ITEM_<idx>` scheme.
    pub fn from_items(items: &[String]) -> Result<Self, ChoiceSetError> {
        Self::new(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| Choice::new(format!("ITEM_{idx}"), item.clone()))
                .collect(),
        )
    }

    pub fn choices(&self) -> &[Choice] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.label.as_str())
    }
}

/// One score the provider assigned to a choice id. Range is validated by the
/// weighting validator, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: String,
    pub score: i64,
}

/// Validated output of the AI weighting path. Created per request, never
/// persisted as authoritative state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub scores: Vec<ScoreEntry>,
    pub reason: String,
}

/// How the current round selects its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionMode {
    Binary,
    BinaryAi,
    Dice,
    /// A user-defined list, referenced by its storage id.
    List(String),
}

impl DecisionMode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "binary" => Self::Binary,
            "binary-ai" | "binaryAI" => Self::BinaryAi,
            "dice" => Self::Dice,
            other => Self::List(other.to_string()),
        }
    }

    /// Human-readable mode label; custom lists show their name when known.
    pub fn label(&self, list_name: Option<&str>) -> String {
        match self {
            Self::Binary => "Sí / No".to_string(),
            Self::BinaryAi => "Sí / No con IA".to_string(),
            Self::Dice => "Dado de seis caras".to_string(),
            Self::List(_) => list_name.unwrap_or("Lista personalizada").to_string(),
        }
    }
}

/// One recorded decision. Append-only; deletion is a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl HistoryEntry {
    /// Builds an entry with a `<unix-millis>-<hex>` id and an RFC 3339
    /// timestamp, matching the legacy on-disk format.
    pub fn now(kind: String, result: String, question: Option<String>, rng: &mut impl rand::Rng) -> Self {
        let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self {
            id: format!("{}-{:06x}", millis, rng.gen_range(0..0x0100_0000u32)),
            kind,
            result,
            timestamp: iso8601_now(),
            question,
        }
    }
}

/// RFC 3339 "now", with the epoch as formatting fallback.
pub fn iso8601_now() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
