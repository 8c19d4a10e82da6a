use super::open_project;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mediakit_builder::Builder;
use mediakit_render::{to_html, HtmlOptions};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit the body fragment only
    #[arg(long)]
    pub fragment: bool,

    /// Single-line output
    #[arg(long)]
    pub compact: bool,

    /// Document title
    #[arg(long, default_value = "Media Kit")]
    pub title: String,
}

impl RenderArgs {
    pub fn html_options(&self) -> HtmlOptions {
        HtmlOptions {
            pretty: !self.compact,
            full_document: !self.fragment,
            title: self.title.clone(),
            ..HtmlOptions::default()
        }
    }
}

pub async fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let (_, builder) = open_project(cwd).await?;
    let html = page(&builder, &args.html_options());

    match &args.out {
        Some(out) => {
            write_output(&cwd.join(out), &html)?;
            println!(
                "  {} Rendered {} component(s) → {}",
                "✓".green(),
                builder.store().snapshot().layout_order.len(),
                out.display()
            );
        }
        None => print!("{}", html),
    }
    Ok(())
}

pub fn page(builder: &Builder, options: &HtmlOptions) -> String {
    to_html(builder.output(), options)
}

pub fn write_output(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)
}
