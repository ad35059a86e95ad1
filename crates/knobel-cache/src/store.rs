//! Generation store: versioned asset snapshots on disk, explicit promotion,
//! and the worker/tab message protocol.

use crate::error::{CacheError, Result};
use crate::policy::{classify, AssetRequest, FetchStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use url::Url;

/// The app shell precached on install.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/app.js",
    "/manifest.webmanifest",
    "/icons/icon.svg",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// Broadcast to every subscribed tab when a generation becomes active. Each
/// tab observes it independently and reloads once; there is no barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SW_ACTIVATED")]
    Activated { version: String },
}

/// Sent by a tab after explicit user confirmation; the only promotion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TabMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Installing,
    Waiting,
    Active,
}

/// Resolves a location to bytes. Install passes manifest paths, serving
/// passes the request path for same-origin work and the full URL for
/// bypassed requests. Errors are plain reasons; the store wraps them.
pub trait AssetFetcher {
    fn fetch(&self, location: &str) -> std::result::Result<Vec<u8>, String>;
}

/// How a request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    FromNetwork(Vec<u8>),
    FromCache(Vec<u8>),
    /// Forwarded untouched; the cache never saw it.
    Bypassed(Vec<u8>),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    active: Option<String>,
    waiting: Option<String>,
}

/// Owns the on-disk cache exclusively; no other component writes to it.
pub struct GenerationStore {
    root: PathBuf,
    app_origin: Url,
    state: StateFile,
    installing: Option<String>,
    subscribers: Vec<Sender<WorkerMessage>>,
}

impl GenerationStore {
    pub fn open(root: impl Into<PathBuf>, app_origin: Url) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| CacheError::Io {
            path: root.clone(),
            source,
        })?;
        let state_path = root.join("state.json");
        let state = if state_path.exists() {
            let bytes = std::fs::read(&state_path).map_err(|source| CacheError::Io {
                path: state_path.clone(),
                source,
            })?;
            serde_json::from_slice(&bytes).map_err(CacheError::CorruptState)?
        } else {
            StateFile::default()
        };
        Ok(Self {
            root,
            app_origin,
            state,
            installing: None,
            subscribers: Vec::new(),
        })
    }

    pub fn active(&self) -> Option<&str> {
        self.state.active.as_deref()
    }

    pub fn waiting(&self) -> Option<&str> {
        self.state.waiting.as_deref()
    }

    pub fn state_of(&self, tag: &str) -> Option<GenerationState> {
        if self.installing.as_deref() == Some(tag) {
            Some(GenerationState::Installing)
        } else if self.state.active.as_deref() == Some(tag) {
            Some(GenerationState::Active)
        } else if self.state.waiting.as_deref() == Some(tag) {
            Some(GenerationState::Waiting)
        } else {
            None
        }
    }

    /// Tabs receive activation broadcasts through this channel.
    pub fn subscribe(&mut self) -> Receiver<WorkerMessage> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Precaches the full manifest into a new generation.
    ///
    /// The result stays **Waiting** until an explicit [`TabMessage::SkipWaiting`]
    /// promotes it: an in-progress session is not interrupted mid-decision.
    /// Installing a newer version replaces a previously waiting one, so at
    /// most two generations exist on disk.
    pub fn install(
        &mut self,
        tag: &str,
        manifest: &[&str],
        fetcher: &impl AssetFetcher,
    ) -> Result<()> {
        if self.state.active.as_deref() == Some(tag) {
            return Ok(());
        }
        self.installing = Some(tag.to_string());

        // Fetch-and-store, all or nothing: a single failed asset fails the
        // whole install and leaves no partial generation behind.
        let mut assets = Vec::with_capacity(manifest.len());
        for path in manifest {
            match fetcher.fetch(path) {
                Ok(bytes) => assets.push((*path, bytes)),
                Err(reason) => {
                    self.installing = None;
                    return Err(CacheError::Fetch {
                        path: (*path).to_string(),
                        reason,
                    });
                }
            }
        }

        if let Some(previous) = self.state.waiting.take() {
            if previous != tag {
                self.purge_generation(&previous)?;
            }
        }

        for (path, bytes) in assets {
            let file = self.cache_file(tag, path)?;
            write_bytes(&file, &bytes)?;
        }

        self.state.waiting = Some(tag.to_string());
        self.installing = None;
        self.save_state()?;
        log_info(&format!("generation {tag} installed, waiting for promotion"));
        Ok(())
    }

    /// The only promotion path; called after explicit user confirmation.
    pub fn handle_message(&mut self, message: TabMessage) -> Result<Option<String>> {
        match message {
            TabMessage::SkipWaiting => match self.state.waiting.clone() {
                Some(tag) => {
                    self.activate(&tag)?;
                    Ok(Some(tag))
                }
                None => Ok(None),
            },
        }
    }

    /// Makes `tag` the single active generation: flips the pointer, purges
    /// every other generation directory, and broadcasts to all tabs.
    pub fn activate(&mut self, tag: &str) -> Result<()> {
        if !self.root.join(tag).is_dir() {
            return Err(CacheError::UnknownGeneration(tag.to_string()));
        }
        self.state.active = Some(tag.to_string());
        if self.state.waiting.as_deref() == Some(tag) {
            self.state.waiting = None;
        }
        for other in self.generations_on_disk()? {
            if other != tag {
                self.purge_generation(&other)?;
            }
        }
        self.save_state()?;
        self.broadcast(WorkerMessage::Activated {
            version: tag.to_string(),
        });
        log_info(&format!("generation {tag} activated"));
        Ok(())
    }

    pub fn generations_on_disk(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| CacheError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut tags = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Io {
                path: self.root.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                tags.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        tags.sort();
        Ok(tags)
    }

    /// Reads an asset from the active generation; `Ok(None)` on a miss or
    /// when nothing is active yet.
    pub fn lookup(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(active) = self.state.active.as_deref() else {
            return Ok(None);
        };
        let file = self.cache_file(active, path)?;
        if !file.is_file() {
            return Ok(None);
        }
        std::fs::read(&file).map(Some).map_err(|source| CacheError::Io {
            path: file,
            source,
        })
    }

    /// Background population: writes a fetched response into the active
    /// generation for next time.
    pub fn store_asset(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let active = self
            .state
            .active
            .as_deref()
            .ok_or(CacheError::NoActiveGeneration)?
            .to_string();
        let file = self.cache_file(&active, path)?;
        write_bytes(&file, bytes)
    }

    /// Answers one request according to its fetch strategy.
    pub fn serve(
        &mut self,
        request: &AssetRequest,
        fetcher: &impl AssetFetcher,
    ) -> Result<Served> {
        match classify(request, &self.app_origin) {
            FetchStrategy::Bypass => {
                let location = request.url.as_str();
                fetcher
                    .fetch(location)
                    .map(Served::Bypassed)
                    .map_err(|reason| CacheError::Fetch {
                        path: location.to_string(),
                        reason,
                    })
            }
            FetchStrategy::NetworkFirst => {
                let path = request.url.path().to_string();
                match fetcher.fetch(&path) {
                    Ok(bytes) => {
                        self.populate(&path, &bytes);
                        Ok(Served::FromNetwork(bytes))
                    }
                    // Offline: cached document, then the app shell entry.
                    Err(_) => match self.lookup(&path)?.or(self.lookup("/")?) {
                        Some(bytes) => Ok(Served::FromCache(bytes)),
                        None => Err(CacheError::Offline(path)),
                    },
                }
            }
            FetchStrategy::CacheFirst => {
                let path = request.url.path().to_string();
                if let Some(bytes) = self.lookup(&path)? {
                    return Ok(Served::FromCache(bytes));
                }
                match fetcher.fetch(&path) {
                    Ok(bytes) => {
                        self.populate(&path, &bytes);
                        Ok(Served::FromNetwork(bytes))
                    }
                    Err(_) => Err(CacheError::Offline(path)),
                }
            }
        }
    }

    /// Best effort; a failed cache write must not fail the response.
    fn populate(&mut self, path: &str, bytes: &[u8]) {
        if self.state.active.is_none() {
            return;
        }
        if let Err(err) = self.store_asset(path, bytes) {
            log_warn(&format!("cache population for {path} failed: {err}"));
        }
    }

    fn broadcast(&mut self, message: WorkerMessage) {
        // Tabs that went away are dropped from the list.
        self.subscribers
            .retain(|tx| tx.send(message.clone()).is_ok());
    }

    fn purge_generation(&self, tag: &str) -> Result<()> {
        let dir = self.root.join(tag);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).map_err(|source| CacheError::Io { path: dir, source })?;
        }
        Ok(())
    }

    fn save_state(&self) -> Result<()> {
        let path = self.root.join("state.json");
        let json = serde_json::to_vec_pretty(&self.state).map_err(CacheError::CorruptState)?;
        std::fs::write(&path, json).map_err(|source| CacheError::Io { path, source })
    }

    /// Maps a request path to its file under a generation; `/` is the
    /// document and shares the `index.html` entry.
    fn cache_file(&self, tag: &str, path: &str) -> Result<PathBuf> {
        if !path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
            return Err(CacheError::BadAssetPath(path.to_string()));
        }
        let relative = if path == "/" { "index.html" } else { &path[1..] };
        Ok(self.root.join(tag).join(relative))
    }
}

fn write_bytes(file: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(file, bytes).map_err(|source| CacheError::Io {
        path: file.to_path_buf(),
        source,
    })
}

fn log_info(message: &str) {
    #[cfg(feature = "telemetry")]
    tracing::info!("{message}");
    #[cfg(not(feature = "telemetry"))]
    let _ = message;
}

fn log_warn(message: &str) {
    #[cfg(feature = "telemetry")]
    tracing::warn!("{message}");
    #[cfg(not(feature = "telemetry"))]
    eprintln!("warning: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeFetcher {
        assets: HashMap<String, Vec<u8>>,
        offline: bool,
    }

    impl FakeFetcher {
        fn shell(version: &str) -> Self {
            let mut assets = HashMap::new();
            for path in DEFAULT_MANIFEST {
                assets.insert(
                    (*path).to_string(),
                    format!("{version}:{path}").into_bytes(),
                );
            }
            Self {
                assets,
                offline: false,
            }
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch(&self, location: &str) -> std::result::Result<Vec<u8>, String> {
            if self.offline {
                return Err("offline".to_string());
            }
            self.assets
                .get(location)
                .cloned()
                .ok_or_else(|| format!("404 {location}"))
        }
    }

    fn origin() -> Url {
        Url::parse("https://app.example").expect("url")
    }

    fn request(path: &str, navigation: bool) -> AssetRequest {
        AssetRequest::get(
            Url::parse(&format!("https://app.example{path}")).expect("url"),
            navigation,
        )
    }

    fn store_with_active(dir: &Path, tag: &str) -> GenerationStore {
        let mut store = GenerationStore::open(dir, origin()).expect("open");
        store
            .install(tag, DEFAULT_MANIFEST, &FakeFetcher::shell(tag))
            .expect("install");
        store
            .handle_message(TabMessage::SkipWaiting)
            .expect("promote");
        store
    }

    #[test]
    fn install_leaves_the_generation_waiting_never_active() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = GenerationStore::open(dir.path(), origin()).expect("open");
        store
            .install("knobel-v4", DEFAULT_MANIFEST, &FakeFetcher::shell("v4"))
            .expect("install");

        assert_eq!(store.state_of("knobel-v4"), Some(GenerationState::Waiting));
        assert_eq!(store.active(), None);
        assert_eq!(store.waiting(), Some("knobel-v4"));
    }

    #[test]
    fn skip_waiting_is_the_only_promotion_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = GenerationStore::open(dir.path(), origin()).expect("open");
        store
            .install("knobel-v4", DEFAULT_MANIFEST, &FakeFetcher::shell("v4"))
            .expect("install");

        let promoted = store
            .handle_message(TabMessage::SkipWaiting)
            .expect("promote");
        assert_eq!(promoted.as_deref(), Some("knobel-v4"));
        assert_eq!(store.state_of("knobel-v4"), Some(GenerationState::Active));

        // A second signal with nothing waiting is a no-op.
        assert_eq!(store.handle_message(TabMessage::SkipWaiting).expect("noop"), None);
    }

    #[test]
    fn activation_purges_every_other_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        store
            .install("knobel-v5", DEFAULT_MANIFEST, &FakeFetcher::shell("v5"))
            .expect("install v5");
        assert_eq!(
            store.generations_on_disk().expect("list"),
            vec!["knobel-v4".to_string(), "knobel-v5".to_string()]
        );

        store
            .handle_message(TabMessage::SkipWaiting)
            .expect("promote v5");
        assert_eq!(
            store.generations_on_disk().expect("list"),
            vec!["knobel-v5".to_string()]
        );
        assert_eq!(store.active(), Some("knobel-v5"));
    }

    #[test]
    fn activation_broadcasts_to_every_tab() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = GenerationStore::open(dir.path(), origin()).expect("open");
        let tab_a = store.subscribe();
        let tab_b = store.subscribe();

        store
            .install("knobel-v5", DEFAULT_MANIFEST, &FakeFetcher::shell("v5"))
            .expect("install");
        store
            .handle_message(TabMessage::SkipWaiting)
            .expect("promote");

        let expected = WorkerMessage::Activated {
            version: "knobel-v5".to_string(),
        };
        assert_eq!(tab_a.try_recv().expect("tab a"), expected);
        assert_eq!(tab_b.try_recv().expect("tab b"), expected);
    }

    #[test]
    fn a_newer_install_replaces_the_waiting_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        store
            .install("knobel-v5", DEFAULT_MANIFEST, &FakeFetcher::shell("v5"))
            .expect("install v5");
        store
            .install("knobel-v6", DEFAULT_MANIFEST, &FakeFetcher::shell("v6"))
            .expect("install v6");

        // Never more than two generations on disk.
        assert_eq!(
            store.generations_on_disk().expect("list"),
            vec!["knobel-v4".to_string(), "knobel-v6".to_string()]
        );
        assert_eq!(store.waiting(), Some("knobel-v6"));
    }

    #[test]
    fn a_failed_install_leaves_no_partial_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = GenerationStore::open(dir.path(), origin()).expect("open");
        let mut fetcher = FakeFetcher::shell("v4");
        fetcher.assets.remove("/styles.css");

        let err = store
            .install("knobel-v4", DEFAULT_MANIFEST, &fetcher)
            .expect_err("missing asset");
        assert!(matches!(err, CacheError::Fetch { .. }));
        assert!(store.generations_on_disk().expect("list").is_empty());
        assert_eq!(store.waiting(), None);
    }

    #[test]
    fn state_survives_a_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            store_with_active(dir.path(), "knobel-v4");
        }
        let store = GenerationStore::open(dir.path(), origin()).expect("reopen");
        assert_eq!(store.active(), Some("knobel-v4"));
    }

    #[test]
    fn static_assets_are_cache_first_with_population() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        let mut fetcher = FakeFetcher::shell("v4");
        fetcher
            .assets
            .insert("/extra.css".to_string(), b"extra".to_vec());

        // Precached asset comes from cache without touching the network.
        let served = store
            .serve(&request("/styles.css", false), &fetcher)
            .expect("serve");
        assert!(matches!(served, Served::FromCache(_)));

        // First miss goes to the network and populates the cache.
        let served = store
            .serve(&request("/extra.css", false), &fetcher)
            .expect("serve");
        assert_eq!(served, Served::FromNetwork(b"extra".to_vec()));

        fetcher.offline = true;
        let served = store
            .serve(&request("/extra.css", false), &fetcher)
            .expect("offline hit");
        assert_eq!(served, Served::FromCache(b"extra".to_vec()));
    }

    #[test]
    fn navigation_prefers_the_network_and_degrades_to_the_shell() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        let mut fetcher = FakeFetcher::shell("v5");

        let served = store
            .serve(&request("/", true), &fetcher)
            .expect("online navigation");
        assert_eq!(served, Served::FromNetwork(b"v5:/".to_vec()));

        fetcher.offline = true;
        let served = store
            .serve(&request("/somewhere-else", true), &fetcher)
            .expect("offline navigation");
        // Unknown document falls back to the cached app shell.
        assert!(matches!(served, Served::FromCache(_)));
    }

    #[test]
    fn offline_with_nothing_cached_is_a_distinct_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = GenerationStore::open(dir.path(), origin()).expect("open");
        let fetcher = FakeFetcher {
            assets: HashMap::new(),
            offline: true,
        };
        let err = store
            .serve(&request("/", true), &fetcher)
            .expect_err("offline");
        assert!(matches!(err, CacheError::Offline(_)));
    }

    #[test]
    fn bypassed_requests_never_touch_the_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        let mut fetcher = FakeFetcher::shell("v4");
        fetcher.assets.insert(
            "https://cdn.example/lib.js".to_string(),
            b"lib".to_vec(),
        );

        let cross = AssetRequest::get(
            Url::parse("https://cdn.example/lib.js").expect("url"),
            false,
        );
        let served = store.serve(&cross, &fetcher).expect("bypass");
        assert_eq!(served, Served::Bypassed(b"lib".to_vec()));
        // Nothing was written for it.
        assert_eq!(store.lookup("/lib.js").expect("lookup"), None);
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_active(dir.path(), "knobel-v4");
        let err = store
            .store_asset("/../outside", b"x")
            .expect_err("traversal");
        assert!(matches!(err, CacheError::BadAssetPath(_)));
    }

    #[test]
    fn messages_use_the_legacy_wire_shape() {
        let msg = WorkerMessage::Activated {
            version: "knobel-v5".to_string(),
        };
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "SW_ACTIVATED", "version": "knobel-v5"})
        );
        let tab: TabMessage =
            serde_json::from_value(serde_json::json!({"type": "SKIP_WAITING"})).expect("parse");
        assert_eq!(tab, TabMessage::SkipWaiting);
    }
}
