pub mod component;
pub mod init;
pub mod render;
pub mod section;
pub mod show;
pub mod watch;

pub use component::{component, ComponentCommand};
pub use init::{init, InitArgs};
pub use render::{render, RenderArgs};
pub use section::{section, SectionCommand};
pub use show::{show, ShowArgs};
pub use watch::{watch, WatchArgs};

use anyhow::{anyhow, Result};
use mediakit_builder::{builtin_templates, Builder, Config};
use mediakit_store::FileCache;
use std::path::Path;

/// Open the project's document. Every store commit is written straight back
/// to the cache file.
pub async fn open_project(cwd: &Path) -> Result<(Config, Builder)> {
    let config = Config::load(cwd)?;
    let cache = FileCache::new(config.cache_file(cwd));
    let builder = Builder::bootstrap(config.clone(), Box::new(cache), builtin_templates(), None).await?;
    Ok((config, builder))
}

/// Parse `key=value` pairs given on the command line
pub fn parse_fields(pairs: &[String]) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut fields = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected key=value, got '{}'", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Empty field name in '{}'", pair));
        }
        fields.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(fields)
}
