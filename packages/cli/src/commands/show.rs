use super::open_project;
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print a single component instead of the whole document
    #[arg(short, long)]
    pub component: Option<String>,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let (_, builder) = open_project(cwd).await?;
    let snapshot = builder.store().snapshot();

    let value = match &args.component {
        Some(id) => serde_json::to_value(
            snapshot
                .component(id)
                .ok_or_else(|| anyhow!("Component not found: {}", id))?,
        )?,
        None => serde_json::to_value(snapshot)?,
    };

    let json = if args.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", json);
    Ok(())
}
