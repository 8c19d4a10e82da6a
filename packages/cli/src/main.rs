mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    component, init, render, section, show, watch, ComponentCommand, InitArgs, RenderArgs,
    SectionCommand, ShowArgs, WatchArgs,
};
use mediakit_builder::{init_logging, Config};
use std::path::PathBuf;

/// Media kit builder - compose, edit and render a media kit document
#[derive(Parser, Debug)]
#[command(name = "mediakit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new media kit project
    Init(InitArgs),

    /// Add, edit, move and remove components
    Component {
        #[command(subcommand)]
        command: ComponentCommand,
    },

    /// Add, retype, style and remove sections
    Section {
        #[command(subcommand)]
        command: SectionCommand,
    },

    /// Render the document to HTML
    Render(RenderArgs),

    /// Print the stored document as JSON
    Show(ShowArgs),

    /// Keep the builder running and re-render on changes
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cwd = match cli.dir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => fail(anyhow::anyhow!("Cannot get current directory: {}", err)),
        },
    };

    // One-shot commands stay quiet unless asked otherwise
    let default_filter = match &cli.command {
        Command::Watch(_) => Config::load(&cwd)
            .map(|config| config.log_filter)
            .unwrap_or_else(|_| "info".to_string()),
        _ => "warn".to_string(),
    };
    init_logging(&default_filter);

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Component { command } => component(command, &cwd).await,
        Command::Section { command } => section(command, &cwd).await,
        Command::Render(args) => render(args, &cwd).await,
        Command::Show(args) => show(args, &cwd).await,
        Command::Watch(args) => watch(args, &cwd).await,
    };

    if let Err(err) = result {
        fail(err);
    }
}

fn fail(err: anyhow::Error) -> ! {
    eprintln!();
    eprintln!("{} {}", "Error:".red().bold(), err);
    eprintln!();
    std::process::exit(1);
}
