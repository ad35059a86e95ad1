//! JSON-file stores for custom lists and the decision history.
//!
//! Both stores read and write whole files, pretty-printed, creating parent
//! directories on demand. The on-disk shapes match the legacy client storage
//! (`customLists` and `decisionHistory` blobs), so existing data keeps
//! loading.

use crate::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A user-defined named list of options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedList {
    pub id: String,
    pub name: String,
    pub items: Vec<String>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(file)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let io = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    let file = File::create(path).map_err(io)?;
    serde_json::to_writer_pretty(file, value).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// File-backed collection of [`SavedList`]s.
#[derive(Debug)]
pub struct ListStore {
    path: PathBuf,
}

impl ListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn all(&self) -> Result<Vec<SavedList>, StorageError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn find(&self, id: &str) -> Result<Option<SavedList>, StorageError> {
        Ok(self.all()?.into_iter().find(|l| l.id == id))
    }

    /// Inserts or replaces a list. An empty id gets a fresh millisecond id,
    /// matching the legacy storage behaviour.
    pub fn save(&self, mut list: SavedList) -> Result<SavedList, StorageError> {
        let mut lists = self.all()?;
        if list.id.is_empty() {
            let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
            list.id = millis.to_string();
        }
        match lists.iter_mut().find(|l| l.id == list.id) {
            Some(existing) => *existing = list.clone(),
            None => lists.push(list.clone()),
        }
        write_json(&self.path, &lists)?;
        Ok(list)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut lists = self.all()?;
        let before = lists.len();
        lists.retain(|l| l.id != id);
        let removed = lists.len() != before;
        if removed {
            write_json(&self.path, &lists)?;
        }
        Ok(removed)
    }
}

/// File-backed, newest-first decision history.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn all(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut history = self.all()?;
        history.insert(0, entry);
        write_json(&self.path, &history)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut history = self.all()?;
        let before = history.len();
        history.retain(|e| e.id != id);
        let removed = history.len() != before;
        if removed {
            write_json(&self.path, &history)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
