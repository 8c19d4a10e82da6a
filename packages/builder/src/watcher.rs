use crate::app::UiEvent;
use crate::errors::WatcherError;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Watches the local cache file and reports external changes as
/// [`UiEvent::CacheChanged`]
pub struct CacheWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl CacheWatcher {
    pub fn new(path: impl Into<PathBuf>, events: mpsc::Sender<UiEvent>) -> WatcherResult<Self> {
        let path = path.into();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| WatcherError::WatchError(format!("not a file path: {}", path.display())))?
            .to_os_string();

        std::fs::create_dir_all(&dir)
            .map_err(|e| WatcherError::WatchError(format!("{}: {}", dir.display(), e)))?;

        // The cache is replaced by rename, so watch the directory
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let Ok(event) = res else {
                    return;
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                if event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    trace!(?event.kind, "cache file changed");
                    // A full queue already holds a pending reload
                    let _ = events.try_send(UiEvent::CacheChanged);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(path = %path.display(), "watching cache file");

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_external_write_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let (tx, mut rx) = mpsc::channel(8);

        let _watcher = CacheWatcher::new(&path, tx).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "{}").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(UiEvent::CacheChanged)));
    }
}
