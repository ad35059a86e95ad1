use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache state file is not valid JSON: {0}")]
    CorruptState(#[source] serde_json::Error),
    #[error("fetching {path} failed: {reason}")]
    Fetch { path: String, reason: String },
    #[error("unknown cache generation: {0}")]
    UnknownGeneration(String),
    #[error("no active cache generation")]
    NoActiveGeneration,
    #[error("asset path is not cacheable: {0}")]
    BadAssetPath(String),
    #[error("offline and {0} is not cached")]
    Offline(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
