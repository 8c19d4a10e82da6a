//! # Media Kit Builder
//!
//! Bootstraps the store, renderer and sync coordinator and drives them from
//! UI events.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = Config::load(&cwd)?;
//! let cache = FileCache::new(config.cache_file(&cwd));
//! let builder = Builder::bootstrap(config, Box::new(cache), builtin_templates(), None).await?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! builder.run(rx, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod app;
pub mod builtin;
pub mod config;
pub mod errors;
pub mod intents;
pub mod logging;
pub mod projection;
pub mod watcher;

pub use app::{BootStage, Builder, RenderHook, TickReport, UiEvent};
pub use builtin::{builtin_templates, property_table};
pub use config::{Config, DEFAULT_CONFIG_NAME};
pub use errors::{BuilderError, BuilderResult, ConfigError, WatcherError};
pub use intents::{apply_intent, IntentOutcome};
pub use logging::{env_filter, init_logging, LOG_ENV};
pub use projection::{close_editor_panel, open_editor_panel, project_preview};
pub use watcher::CacheWatcher;
