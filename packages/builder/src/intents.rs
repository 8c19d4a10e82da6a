//! Control-surface intents turned into store operations

use mediakit_render::{ComponentAction, Intent, SectionAction};
use mediakit_store::{Direction, LayoutType, Store};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The store accepted the operation
    Applied,
    /// Duplicate produced a new component
    Created(String),
    /// The store refused it (unknown id, list boundary, ...)
    Rejected,
    /// The user declined the confirmation prompt
    Cancelled,
    /// Edit does not touch the store; the caller opens the editor panel
    OpenEditor(String),
}

/// Apply `intent` to `store`. `confirm` is asked before destructive section
/// removals and receives the prompt text.
pub fn apply_intent(
    store: &mut Store,
    intent: &Intent,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> IntentOutcome {
    debug!(?intent, "applying intent");
    match intent {
        Intent::Component {
            action,
            component_id,
        } => apply_component_action(store, *action, component_id),
        Intent::Section {
            action,
            section_id,
            next_layout,
            requires_confirmation,
        } => match action {
            SectionAction::Retype => {
                let Some(current) = store.snapshot().section(section_id) else {
                    return IntentOutcome::Rejected;
                };
                let target = next_layout
                    .clone()
                    .unwrap_or_else(|| current.layout_type.next());
                applied(store.retype_section(section_id, target))
            }
            SectionAction::InsertAfter => {
                match store.insert_section_after(section_id, LayoutType::FullWidth) {
                    Some(id) => IntentOutcome::Created(id),
                    None => IntentOutcome::Rejected,
                }
            }
            SectionAction::Remove => {
                let non_empty = store
                    .snapshot()
                    .section(section_id)
                    .is_some_and(|s| !s.is_empty());
                if (*requires_confirmation || non_empty)
                    && !confirm("Remove this section? Its components stay in the document.")
                {
                    info!(%section_id, "section removal cancelled");
                    return IntentOutcome::Cancelled;
                }
                applied(store.remove_section(section_id))
            }
        },
    }
}

fn apply_component_action(store: &mut Store, action: ComponentAction, id: &str) -> IntentOutcome {
    match action {
        ComponentAction::Edit => {
            if store.component(id).is_some() {
                IntentOutcome::OpenEditor(id.to_string())
            } else {
                IntentOutcome::Rejected
            }
        }
        ComponentAction::MoveUp => applied(store.move_component(id, Direction::Up)),
        ComponentAction::MoveDown => applied(store.move_component(id, Direction::Down)),
        ComponentAction::Duplicate => match store.duplicate_component(id) {
            Some(new_id) => IntentOutcome::Created(new_id),
            None => IntentOutcome::Rejected,
        },
        ComponentAction::Delete => applied(store.remove_component(id)),
    }
}

fn applied(accepted: bool) -> IntentOutcome {
    if accepted {
        IntentOutcome::Applied
    } else {
        IntentOutcome::Rejected
    }
}
