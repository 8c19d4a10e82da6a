use crate::errors::ConfigError;
use mediakit_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "mediakit.config.json";

/// Media kit builder configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Local cache file, relative to the project directory
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Quiet period before an edit propagates
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a guarded write keeps the target's listener detached
    #[serde(default = "default_reattach_delay_ms")]
    pub reattach_delay_ms: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Buffered state-changed signals per subscriber
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,

    /// Log filter used when `MEDIAKIT_LOG` and `RUST_LOG` are unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Reload the store when the cache file changes on disk
    #[serde(default = "default_watch_cache")]
    pub watch_cache: bool,
}

fn default_cache_path() -> String {
    ".mediakit/state.json".to_string()
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_reattach_delay_ms() -> u64 {
    50
}

fn default_history_limit() -> usize {
    mediakit_store::DEFAULT_HISTORY_LIMIT
}

fn default_signal_capacity() -> usize {
    mediakit_store::DEFAULT_SIGNAL_CAPACITY
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_watch_cache() -> bool {
    true
}

impl Config {
    /// Load config from a directory; defaults when the file is missing
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, cwd: &Path) -> Result<PathBuf, ConfigError> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);
        std::fs::write(&config_path, serde_json::to_string_pretty(self)?)?;
        Ok(config_path)
    }

    /// Absolute path of the local cache
    pub fn cache_file(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.cache_path)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            reattach_delay: Duration::from_millis(self.reattach_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            debounce_ms: default_debounce_ms(),
            reattach_delay_ms: default_reattach_delay_ms(),
            history_limit: default_history_limit(),
            signal_capacity: default_signal_capacity(),
            log_filter: default_log_filter(),
            watch_cache: default_watch_cache(),
        }
    }
}
