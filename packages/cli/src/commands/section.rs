use super::open_project;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use mediakit_builder::{Builder, IntentOutcome};
use mediakit_render::{Intent, SectionAction};
use mediakit_store::{BackgroundType, LayoutType, SectionOptions};
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum SectionCommand {
    /// Append a section
    Add {
        /// full-width, two-column, three-column, main-aside, grid or hero
        #[arg(default_value = "full-width")]
        layout: String,

        /// Insert after this section instead of appending
        #[arg(long)]
        after: Option<String>,
    },

    /// Change a section's layout; cycles to the next one when omitted
    Retype { id: String, layout: Option<String> },

    /// Place a component in a section column (1-based)
    Assign {
        component: String,
        section: String,

        #[arg(short, long, default_value = "1")]
        column: i32,
    },

    /// Set background and spacing overrides
    Style {
        id: String,

        /// Background color; implies a color background
        #[arg(long)]
        background: Option<String>,

        /// small, medium, large or none
        #[arg(long)]
        spacing_top: Option<String>,

        #[arg(long)]
        spacing_bottom: Option<String>,
    },

    /// Remove a section; its components stay in the document
    Remove {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn section(command: SectionCommand, cwd: &Path) -> Result<()> {
    let (_, mut builder) = open_project(cwd).await?;

    match command {
        SectionCommand::Add { layout, after } => {
            let layout = LayoutType::parse(&layout);
            warn_unknown(&layout);
            let id = match after {
                Some(after) => builder
                    .store_mut()
                    .insert_section_after(&after, layout.clone())
                    .ok_or_else(|| anyhow!("Section not found: {}", after))?,
                None => builder.store_mut().add_section(layout.clone()),
            };
            println!("  {} Added {} section {}", "✓".green(), layout, id.bright_white());
        }
        SectionCommand::Retype { id, layout } => {
            let next_layout = layout.as_deref().map(LayoutType::parse);
            if let Some(layout) = &next_layout {
                warn_unknown(layout);
            }
            let intent = Intent::Section {
                action: SectionAction::Retype,
                section_id: id.clone(),
                next_layout,
                requires_confirmation: false,
            };
            expect_applied(&mut builder, &intent, &id, &mut |_| true)?;
            let layout = builder
                .store()
                .snapshot()
                .section(&id)
                .map(|s| s.layout_type.to_string())
                .unwrap_or_default();
            println!("  {} {} is now {}", "✓".green(), id, layout);
        }
        SectionCommand::Assign {
            component,
            section,
            column,
        } => {
            if !builder.store_mut().assign_component(&component, &section, column) {
                return Err(anyhow!("Cannot place {} in {}", component, section));
            }
            println!(
                "  {} Placed {} in {} column {}",
                "✓".green(),
                component,
                section,
                column
            );
        }
        SectionCommand::Style {
            id,
            background,
            spacing_top,
            spacing_bottom,
        } => {
            let options = SectionOptions {
                background_type: background.as_ref().map(|_| BackgroundType::Color),
                background_color: background,
                spacing_top,
                spacing_bottom,
            };
            if !builder.store_mut().update_section_options(&id, options) {
                return Err(anyhow!("Section not found: {}", id));
            }
            println!("  {} Updated {}", "✓".green(), id);
        }
        SectionCommand::Remove { id, yes } => {
            let intent = Intent::Section {
                action: SectionAction::Remove,
                section_id: id.clone(),
                next_layout: None,
                requires_confirmation: false,
            };
            let mut confirm = |prompt: &str| yes || ask(prompt);
            match builder.apply_intent(&intent, &mut confirm) {
                IntentOutcome::Applied => println!("  {} Removed {}", "✓".green(), id),
                IntentOutcome::Cancelled => println!("{}", "Cancelled".yellow()),
                _ => return Err(anyhow!("Section not found: {}", id)),
            }
        }
    }

    Ok(())
}

fn expect_applied(
    builder: &mut Builder,
    intent: &Intent,
    id: &str,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<()> {
    match builder.apply_intent(intent, confirm) {
        IntentOutcome::Applied => Ok(()),
        _ => Err(anyhow!("Section not found: {}", id)),
    }
}

fn warn_unknown(layout: &LayoutType) {
    if !layout.is_known() {
        println!(
            "{} Unknown layout '{}' renders as full-width",
            "⚠️".yellow(),
            layout
        );
    }
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}
