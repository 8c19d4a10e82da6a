//! # Persistence
//!
//! Two collaborators back the store:
//!
//! - a [`LocalCache`], read once at startup and written synchronously after
//!   every mutation (best-effort)
//! - a [`RemoteSnapshotService`], consulted at startup only when the cache
//!   is empty and written asynchronously by a background task
//!
//! The remote writer coalesces bursts: when several snapshots are queued
//! only the latest one is sent (last writer wins).

use crate::errors::{CacheError, RemoteError};
use crate::model::Snapshot;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Synchronous, best-effort local storage
pub trait LocalCache: Send {
    /// `Ok(None)` when nothing has been cached yet
    fn load(&self) -> Result<Option<Snapshot>, CacheError>;

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), CacheError>;

    /// Backing file, if any
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Request/response contract of the remote persistence backend
pub trait RemoteSnapshotService: Send + Sync {
    /// Last saved snapshot, if any
    fn load(&self) -> BoxFuture<'_, Result<Option<Snapshot>, RemoteError>>;

    fn save(&self, snapshot: Arc<Snapshot>) -> BoxFuture<'_, Result<(), RemoteError>>;
}

/// JSON file cache
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> Result<Option<Snapshot>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(snapshot)?;

        // Write then rename so readers never observe a half-written file
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[derive(Debug, Default)]
struct MemoryCacheState {
    raw: Option<String>,
    failing: bool,
    saves: usize,
}

/// In-memory cache handle; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<MemoryCacheState>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self, CacheError> {
        let cache = Self::new();
        cache.lock().raw = Some(serde_json::to_string(snapshot)?);
        Ok(cache)
    }

    /// Seed with raw contents, valid or not
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let cache = Self::new();
        cache.lock().raw = Some(raw.into());
        cache
    }

    /// Make subsequent saves fail
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    pub fn contents(&self) -> Option<Snapshot> {
        let raw = self.lock().raw.clone()?;
        serde_json::from_str(&raw).ok()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCacheState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> Result<Option<Snapshot>, CacheError> {
        match self.lock().raw.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), CacheError> {
        let raw = serde_json::to_string(snapshot)?;
        let mut state = self.lock();
        if state.failing {
            return Err(CacheError::Unavailable("cache is read-only".to_string()));
        }
        state.raw = Some(raw);
        state.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryRemoteState {
    snapshot: Option<Snapshot>,
    failing: bool,
    saves: usize,
}

/// In-memory remote service; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<MemoryRemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let remote = Self::new();
        remote.lock().snapshot = Some(snapshot);
        remote
    }

    /// Make subsequent loads and saves fail
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.lock().snapshot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemoteState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RemoteSnapshotService for MemoryRemote {
    fn load(&self) -> BoxFuture<'_, Result<Option<Snapshot>, RemoteError>> {
        Box::pin(async move {
            let state = self.lock();
            if state.failing {
                return Err(RemoteError::Unavailable("load failed".to_string()));
            }
            Ok(state.snapshot.clone())
        })
    }

    fn save(&self, snapshot: Arc<Snapshot>) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state.failing {
                return Err(RemoteError::Unavailable("save failed".to_string()));
            }
            state.snapshot = Some((*snapshot).clone());
            state.saves += 1;
            Ok(())
        })
    }
}

/// Result of one remote write
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        last_modified: Option<i64>,
        /// Queued snapshots superseded by this one
        coalesced: usize,
    },
    Failed(RemoteError),
}

/// Sending half of the remote writer
#[derive(Debug, Clone)]
pub struct RemoteSink {
    tx: mpsc::UnboundedSender<Arc<Snapshot>>,
}

impl RemoteSink {
    /// Queue a snapshot for the background writer
    pub fn submit(&self, snapshot: Arc<Snapshot>) -> Result<(), RemoteError> {
        self.tx.send(snapshot).map_err(|_| RemoteError::Closed)
    }
}

pub struct RemoteWriter {
    pub sink: RemoteSink,
    pub outcomes: mpsc::UnboundedReceiver<SaveOutcome>,
    pub handle: JoinHandle<()>,
}

/// Spawn the background task that forwards snapshots to `service`.
///
/// Must be called from within a tokio runtime. The task ends when every
/// [`RemoteSink`] has been dropped.
pub fn spawn_remote_writer(service: Arc<dyn RemoteSnapshotService>) -> RemoteWriter {
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<Snapshot>>();
    let (outcome_tx, outcomes) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        while let Some(mut snapshot) = rx.recv().await {
            let mut coalesced = 0;
            while let Ok(newer) = rx.try_recv() {
                snapshot = newer;
                coalesced += 1;
            }

            let outcome = match service.save(snapshot.clone()).await {
                Ok(()) => {
                    debug!(coalesced, "remote snapshot saved");
                    SaveOutcome::Saved {
                        last_modified: snapshot.meta.last_modified,
                        coalesced,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "remote save failed; local cache remains authoritative");
                    SaveOutcome::Failed(e)
                }
            };

            // Nobody listening is fine
            let _ = outcome_tx.send(outcome);
        }
    });

    RemoteWriter {
        sink: RemoteSink { tx },
        outcomes,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot
            .components
            .insert("c1".into(), Component::new("hero").with_id("c1"));
        snapshot.layout_order.push("c1".into());
        snapshot
    }

    #[test]
    fn test_memory_cache_shared_between_clones() {
        let cache = MemoryCache::new();
        let mut writer = cache.clone();
        writer.save(&sample()).unwrap();

        assert_eq!(cache.saves(), 1);
        assert_eq!(cache.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_memory_cache_corrupt_contents() {
        let cache = MemoryCache::with_raw("{not json");
        assert!(matches!(cache.load(), Err(CacheError::Serde(_))));
    }

    #[test]
    fn test_file_cache_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("state.json"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FileCache::new(dir.path().join("nested").join("state.json"));
        cache.save(&sample()).unwrap();

        assert_eq!(cache.load().unwrap(), Some(sample()));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remote_writer_reports_failures() {
        let remote = MemoryRemote::new();
        remote.set_failing(true);
        let mut writer = spawn_remote_writer(Arc::new(remote.clone()));

        writer.sink.submit(Arc::new(sample())).unwrap();
        let outcome = writer.outcomes.recv().await.unwrap();

        assert!(matches!(outcome, SaveOutcome::Failed(RemoteError::Unavailable(_))));
        assert_eq!(remote.saves(), 0);
    }
}
