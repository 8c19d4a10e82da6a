//! # Document Mutations
//!
//! Every change to a snapshot is expressed as a [`Mutation`]. The store
//! applies a mutation to a copy of the current snapshot and commits the copy
//! only when `apply` succeeds, so a failed mutation never leaves a partial
//! write behind.
//!
//! ## Mutation Semantics
//!
//! ### AddComponent
//! - Upserts by id; the id is appended to the layout order once
//!
//! ### UpdateComponent
//! - Top-level keys of the patch replace the same keys in `data`
//!
//! ### RemoveComponent
//! - Strips the id from the layout order and from every section
//!
//! ### AssignComponent
//! - A component lives in at most one section; assigning moves it
//! - Out-of-range columns are clamped, never rejected
//!
//! ### RemoveSection
//! - Assigned components stay in the document, unassigned

use crate::model::{
    merge_data, ColumnAssignment, Component, ComponentData, LayoutType, PartialSnapshot, Section,
    SectionOptions, Snapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert or replace a component (the id must already be assigned)
    AddComponent { component: Component },

    /// Merge a partial payload into a component's data
    UpdateComponent { id: String, data: ComponentData },

    RemoveComponent { id: String },

    /// Swap a component with its neighbour
    MoveComponent { id: String, direction: Direction },

    /// Deep copy a component under `new_id`, right after the original
    DuplicateComponent { id: String, new_id: String },

    /// Replace the document order; unknown ids are dropped
    SetLayoutOrder { order: Vec<String> },

    /// Append a section, or insert it right after `after`
    AddSection {
        section: Section,
        after: Option<String>,
    },

    RetypeSection { id: String, layout_type: LayoutType },

    UpdateSectionOptions { id: String, options: SectionOptions },

    RemoveSection { id: String },

    AssignComponent {
        component_id: String,
        section_id: String,
        column: i32,
    },

    UpdateGlobalSettings { settings: Map<String, Value> },

    /// Shallow merge of top-level keys
    SetState { partial: PartialSnapshot },

    /// Back to the empty document
    Reset,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Component id is empty")]
    EmptyId,

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Component {0} cannot move further")]
    AtBoundary(String),
}

impl Mutation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddComponent { .. } => "add_component",
            Mutation::UpdateComponent { .. } => "update_component",
            Mutation::RemoveComponent { .. } => "remove_component",
            Mutation::MoveComponent { .. } => "move_component",
            Mutation::DuplicateComponent { .. } => "duplicate_component",
            Mutation::SetLayoutOrder { .. } => "set_layout_order",
            Mutation::AddSection { .. } => "add_section",
            Mutation::RetypeSection { .. } => "retype_section",
            Mutation::UpdateSectionOptions { .. } => "update_section_options",
            Mutation::RemoveSection { .. } => "remove_section",
            Mutation::AssignComponent { .. } => "assign_component",
            Mutation::UpdateGlobalSettings { .. } => "update_global_settings",
            Mutation::SetState { .. } => "set_state",
            Mutation::Reset => "reset",
        }
    }

    /// Apply mutation to a snapshot
    pub fn apply(&self, snapshot: &mut Snapshot) -> Result<(), MutationError> {
        match self {
            Mutation::AddComponent { component } => Self::apply_add(snapshot, component),

            Mutation::UpdateComponent { id, data } => {
                let component = snapshot
                    .components
                    .get_mut(id)
                    .ok_or_else(|| MutationError::ComponentNotFound(id.clone()))?;
                merge_data(&mut component.data, data);
                Ok(())
            }

            Mutation::RemoveComponent { id } => Self::apply_remove(snapshot, id),

            Mutation::MoveComponent { id, direction } => Self::apply_move(snapshot, id, *direction),

            Mutation::DuplicateComponent { id, new_id } => {
                Self::apply_duplicate(snapshot, id, new_id)
            }

            Mutation::SetLayoutOrder { order } => {
                let mut seen = std::collections::HashSet::new();
                snapshot.layout_order = order
                    .iter()
                    .filter(|id| {
                        let known = snapshot.components.contains_key(*id);
                        if !known {
                            tracing::warn!(component_id = %id, "dropping unknown id from layout order");
                        }
                        known && seen.insert((*id).clone())
                    })
                    .cloned()
                    .collect();
                Ok(())
            }

            Mutation::AddSection { section, after } => {
                Self::apply_add_section(snapshot, section, after.as_deref())
            }

            Mutation::RetypeSection { id, layout_type } => {
                let section = Self::section_mut(snapshot, id)?;
                section.layout_type = layout_type.clone();
                for assignment in &mut section.column_assignment {
                    assignment.column = layout_type.clamp_column(assignment.column);
                }
                Ok(())
            }

            Mutation::UpdateSectionOptions { id, options } => {
                Self::section_mut(snapshot, id)?.options.merge(options);
                Ok(())
            }

            Mutation::RemoveSection { id } => {
                let index = snapshot
                    .section_index(id)
                    .ok_or_else(|| MutationError::SectionNotFound(id.clone()))?;
                snapshot.sections.remove(index);
                Ok(())
            }

            Mutation::AssignComponent {
                component_id,
                section_id,
                column,
            } => Self::apply_assign(snapshot, component_id, section_id, *column),

            Mutation::UpdateGlobalSettings { settings } => {
                merge_data(&mut snapshot.global_settings, settings);
                Ok(())
            }

            Mutation::SetState { partial } => {
                Self::apply_set_state(snapshot, partial);
                Ok(())
            }

            Mutation::Reset => {
                *snapshot = Snapshot::default();
                Ok(())
            }
        }
    }

    fn section_mut<'a>(snapshot: &'a mut Snapshot, id: &str) -> Result<&'a mut Section, MutationError> {
        snapshot
            .sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| MutationError::SectionNotFound(id.to_string()))
    }

    fn apply_add(snapshot: &mut Snapshot, component: &Component) -> Result<(), MutationError> {
        if component.id.is_empty() {
            return Err(MutationError::EmptyId);
        }
        snapshot
            .components
            .insert(component.id.clone(), component.clone());
        if !snapshot.layout_order.contains(&component.id) {
            snapshot.layout_order.push(component.id.clone());
        }
        Ok(())
    }

    fn apply_remove(snapshot: &mut Snapshot, id: &str) -> Result<(), MutationError> {
        if snapshot.components.remove(id).is_none() {
            return Err(MutationError::ComponentNotFound(id.to_string()));
        }
        snapshot.layout_order.retain(|existing| existing != id);
        for section in &mut snapshot.sections {
            section.column_assignment.retain(|a| a.component_id != id);
        }
        Ok(())
    }

    fn apply_move(snapshot: &mut Snapshot, id: &str, direction: Direction) -> Result<(), MutationError> {
        if !snapshot.components.contains_key(id) {
            return Err(MutationError::ComponentNotFound(id.to_string()));
        }

        let mut moved = false;

        if let Some(index) = snapshot.layout_order.iter().position(|c| c == id) {
            if let Some(target) = neighbour(index, snapshot.layout_order.len(), direction) {
                snapshot.layout_order.swap(index, target);
                moved = true;
            }
        }

        // Within a section, swap with the nearest assignment in the same column
        if let Some((s, a)) = snapshot.placement_of(id) {
            let assignments = &mut snapshot.sections[s].column_assignment;
            let column = assignments[a].column;
            let target = match direction {
                Direction::Up => (0..a).rev().find(|&i| assignments[i].column == column),
                Direction::Down => (a + 1..assignments.len()).find(|&i| assignments[i].column == column),
            };
            if let Some(target) = target {
                assignments.swap(a, target);
                moved = true;
            }
        }

        if moved {
            Ok(())
        } else {
            Err(MutationError::AtBoundary(id.to_string()))
        }
    }

    fn apply_duplicate(snapshot: &mut Snapshot, id: &str, new_id: &str) -> Result<(), MutationError> {
        if new_id.is_empty() {
            return Err(MutationError::EmptyId);
        }
        if snapshot.components.contains_key(new_id) {
            return Err(MutationError::DuplicateId(new_id.to_string()));
        }
        let original = snapshot
            .components
            .get(id)
            .ok_or_else(|| MutationError::ComponentNotFound(id.to_string()))?;

        let copy = original.clone().with_id(new_id);
        snapshot.components.insert(new_id.to_string(), copy);

        match snapshot.layout_order.iter().position(|c| c == id) {
            Some(index) => snapshot.layout_order.insert(index + 1, new_id.to_string()),
            None => snapshot.layout_order.push(new_id.to_string()),
        }

        if let Some((s, a)) = snapshot.placement_of(id) {
            let assignments = &mut snapshot.sections[s].column_assignment;
            let column = assignments[a].column;
            assignments.insert(a + 1, ColumnAssignment::new(new_id, column));
        }

        Ok(())
    }

    fn apply_add_section(
        snapshot: &mut Snapshot,
        section: &Section,
        after: Option<&str>,
    ) -> Result<(), MutationError> {
        if section.id.is_empty() {
            return Err(MutationError::EmptyId);
        }
        if snapshot.section(&section.id).is_some() {
            return Err(MutationError::DuplicateId(section.id.clone()));
        }

        let mut section = section.clone();
        let components = &snapshot.components;
        let layout = section.layout_type.clone();
        section
            .column_assignment
            .retain(|a| components.contains_key(&a.component_id));
        for assignment in &mut section.column_assignment {
            assignment.column = layout.clamp_column(assignment.column);
        }

        match after {
            Some(after) => {
                let index = snapshot
                    .section_index(after)
                    .ok_or_else(|| MutationError::SectionNotFound(after.to_string()))?;
                snapshot.sections.insert(index + 1, section);
            }
            None => snapshot.sections.push(section),
        }
        Ok(())
    }

    fn apply_assign(
        snapshot: &mut Snapshot,
        component_id: &str,
        section_id: &str,
        column: i32,
    ) -> Result<(), MutationError> {
        if !snapshot.components.contains_key(component_id) {
            return Err(MutationError::ComponentNotFound(component_id.to_string()));
        }
        let index = snapshot
            .section_index(section_id)
            .ok_or_else(|| MutationError::SectionNotFound(section_id.to_string()))?;

        for section in &mut snapshot.sections {
            section
                .column_assignment
                .retain(|a| a.component_id != component_id);
        }

        let section = &mut snapshot.sections[index];
        let column = section.layout_type.clamp_column(column);
        section
            .column_assignment
            .push(ColumnAssignment::new(component_id, column));
        Ok(())
    }

    fn apply_set_state(snapshot: &mut Snapshot, partial: &PartialSnapshot) {
        if let Some(components) = &partial.components {
            snapshot.components = components.clone();
        }
        if let Some(layout_order) = &partial.layout_order {
            snapshot.layout_order = layout_order.clone();
        }
        if let Some(sections) = &partial.sections {
            snapshot.sections = sections.clone();
        }
        if let Some(global_settings) = &partial.global_settings {
            snapshot.global_settings = global_settings.clone();
        }

        for violation in snapshot.sanitize() {
            tracing::warn!(%violation, "repaired reference while merging state");
        }
    }
}

fn neighbour(index: usize, len: usize, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => (index + 1 < len).then_some(index + 1),
    }
}
