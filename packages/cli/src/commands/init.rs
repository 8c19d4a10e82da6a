use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mediakit_builder::{Config, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Local cache file, relative to the project directory
    #[arg(short, long)]
    pub cache_path: Option<String>,

    /// Edit debounce in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing media kit project...".bright_blue().bold());

    let mut config = Config::default();
    if let Some(cache_path) = args.cache_path {
        config.cache_path = cache_path;
    }
    if let Some(debounce_ms) = args.debounce_ms {
        config.debounce_ms = debounce_ms;
    }

    // Create the cache directory so the first save does not have to
    let cache_file = config.cache_file(cwd);
    if let Some(cache_dir) = cache_file.parent() {
        if !cache_dir.exists() {
            fs::create_dir_all(cache_dir)?;
            println!("  {} Created {}/", "✓".green(), cache_dir.display());
        }
    }

    config.save(cwd)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: mediakit component add hero --set title=\"Your Name\"");
    println!("  2. Run: mediakit render --out media-kit.html");
    println!("  3. Run: mediakit watch --out media-kit.html");

    Ok(())
}
