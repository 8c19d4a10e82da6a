use super::{open_project, parse_fields};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use mediakit_builder::{Builder, IntentOutcome};
use mediakit_render::{ComponentAction, Intent};
use mediakit_store::Component;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ComponentCommand {
    /// Add a component at the end of the document
    Add {
        /// Component type (hero, biography, topics, ...)
        kind: String,

        /// Initial fields as key=value
        #[arg(short = 's', long = "set")]
        fields: Vec<String>,
    },

    /// Merge fields into a component's data
    Set {
        id: String,

        /// Fields as key=value
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Move a component one step up or down
    Move {
        id: String,

        /// up or down
        direction: String,
    },

    /// Insert a copy right after a component
    Duplicate { id: String },

    /// Remove a component
    Remove { id: String },

    /// List components in document order
    List,
}

pub async fn component(command: ComponentCommand, cwd: &Path) -> Result<()> {
    let (_, mut builder) = open_project(cwd).await?;

    match command {
        ComponentCommand::Add { kind, fields } => {
            let mut component = Component::new(kind.as_str());
            component.data = parse_fields(&fields)?;
            let id = builder.store_mut().add_component(component);
            println!("  {} Added {} {}", "✓".green(), kind, id.bright_white());
        }
        ComponentCommand::Set { id, fields } => {
            let data = parse_fields(&fields)?;
            let count = data.len();
            if !builder.store_mut().update_component(&id, data) {
                return Err(anyhow!("Component not found: {}", id));
            }
            println!("  {} Updated {} field(s) on {}", "✓".green(), count, id);
        }
        ComponentCommand::Move { id, direction } => {
            let action = match direction.as_str() {
                "up" => ComponentAction::MoveUp,
                "down" => ComponentAction::MoveDown,
                other => return Err(anyhow!("Invalid direction: {}. Use: up or down", other)),
            };
            expect_applied(&mut builder, action, &id)?;
            println!("  {} Moved {} {}", "✓".green(), id, direction);
        }
        ComponentCommand::Duplicate { id } => {
            match run_action(&mut builder, ComponentAction::Duplicate, &id) {
                IntentOutcome::Created(copy) => {
                    println!("  {} Duplicated {} as {}", "✓".green(), id, copy.bright_white())
                }
                _ => return Err(anyhow!("Component not found: {}", id)),
            }
        }
        ComponentCommand::Remove { id } => {
            expect_applied(&mut builder, ComponentAction::Delete, &id)?;
            println!("  {} Removed {}", "✓".green(), id);
        }
        ComponentCommand::List => list(&builder),
    }

    Ok(())
}

fn run_action(builder: &mut Builder, action: ComponentAction, id: &str) -> IntentOutcome {
    builder.apply_intent(&Intent::component(action, id), &mut |_| true)
}

fn expect_applied(builder: &mut Builder, action: ComponentAction, id: &str) -> Result<()> {
    match run_action(builder, action, id) {
        IntentOutcome::Applied => Ok(()),
        _ if builder.store().component(id).is_none() => Err(anyhow!("Component not found: {}", id)),
        _ => Err(anyhow!("Cannot {} {}", action.as_str(), id)),
    }
}

fn list(builder: &Builder) {
    let snapshot = builder.store().snapshot();
    if snapshot.layout_order.is_empty() {
        println!("{}", "⚠️  No components yet".yellow());
        return;
    }

    for component in snapshot.ordered_components() {
        let placement = snapshot
            .placement_of(&component.id)
            .and_then(|(section, _)| snapshot.sections.get(section))
            .map(|section| format!(" in {}", section.id))
            .unwrap_or_default();
        println!(
            "  {} {}{}",
            component.id.bright_white(),
            component.kind,
            placement.dimmed()
        );
    }
}
