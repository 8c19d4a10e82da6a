use super::open_project;
use super::render::write_output;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mediakit_builder::CacheWatcher;
use mediakit_render::{to_html, HtmlOptions};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Re-render into this file whenever the document changes
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Ignore external changes to the cache file
    #[arg(long)]
    pub no_reload: bool,
}

/// Keep the builder running: reload on external cache changes and re-render
/// on every change until Ctrl-C.
pub async fn watch(args: WatchArgs, cwd: &Path) -> Result<()> {
    let (config, mut builder) = open_project(cwd).await?;
    let (tx, rx) = mpsc::channel(64);

    let options = HtmlOptions {
        full_document: true,
        ..HtmlOptions::default()
    };

    if let Some(out) = &args.out {
        let out = cwd.join(out);
        write_output(&out, &to_html(builder.output(), &options))?;
        println!("  {} Rendered → {}", "✓".green(), out.display());

        builder.set_render_hook(Box::new(move |document| {
            match write_output(&out, &to_html(document, &options)) {
                Ok(()) => info!(path = %out.display(), "re-rendered"),
                Err(e) => warn!(path = %out.display(), error = %e, "failed to write output"),
            }
        }));
    }

    let _watcher = if config.watch_cache && !args.no_reload {
        let watcher = CacheWatcher::new(config.cache_file(cwd), tx.clone())?;
        println!("  {} Watching {}", "✓".green(), watcher.path().display());
        Some(watcher)
    } else {
        None
    };

    println!("{}", "👀 Watching for changes (Ctrl-C to stop)".bright_blue().bold());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    // Keep a sender alive so the loop only ends on Ctrl-C
    let _tx = tx;
    let builder = builder.run(rx, shutdown).await?;

    println!();
    println!(
        "✨ {} {} component(s) saved",
        "Done".green().bold(),
        builder.store().snapshot().layout_order.len()
    );
    Ok(())
}

