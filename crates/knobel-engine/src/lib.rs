#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Gewichtete Entscheidungslogik für knobel.
//!
//! Der Validator prüft die Antwort des Modells gegen die erwartete
//! Id-Menge, bevor der Sampler daraus eine Option zieht. Eine ungültige
//! Antwort erreicht den Sampler nie; beide Seiten der Netzwerkgrenze
//! führen dieselbe Prüfung unabhängig voneinander aus.

pub mod sample;
pub mod session;
pub mod validate;

pub use sample::{pick_uniform, pick_weighted, suspense_duration};
pub use session::{DecisionSession, Phase, SessionError};
pub use validate::{validate_scoring, ShapeError};
