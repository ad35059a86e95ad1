//! Scoring edge service.
//!
//! The trust boundary between the app and the upstream model provider:
//! authenticates to OpenRouter, constrains the prompt, re-validates the
//! model's output independently of the client, and enforces an origin
//! allow-list before any upstream call is made.

pub mod config;
pub mod error;
pub mod prompt;
pub mod routes;
pub mod upstream;

pub use config::Args;
pub use error::ApiError;
pub use routes::{router, AppState};
