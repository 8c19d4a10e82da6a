//! # Undo/Redo History
//!
//! Snapshot-based history for the store.
//!
//! ## Design
//!
//! - Before a commit the previous snapshot is recorded
//! - Undo swaps the current snapshot with the most recent recorded one
//! - Redo reverses an undo
//! - New commits clear the redo stack
//! - A batch of mutations records a single entry (the snapshot before the
//!   batch began), so it undoes as one step
//!
//! Snapshots are shared behind `Arc`, so recording is a pointer copy.

use crate::model::Snapshot;
use std::sync::Arc;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug)]
pub struct History {
    /// Previous snapshots (most recent last)
    undo_stack: Vec<Arc<Snapshot>>,

    /// Undone snapshots (most recent last)
    redo_stack: Vec<Arc<Snapshot>>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record the snapshot that a new commit replaces
    pub fn record(&mut self, previous: Arc<Snapshot>) {
        self.undo_stack.push(previous);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Step back; returns the snapshot to restore
    pub fn undo(&mut self, current: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward; returns the snapshot to restore
    pub fn redo(&mut self, current: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
