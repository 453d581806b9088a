//! Undo/redo history of full scene snapshots.
//!
//! Every committed gesture pushes exactly one entry: the scene as it was
//! *before* the gesture. Live drag frames never reach the history, so a
//! whole move, resize, rotate, crop session or keyboard nudge undoes in one
//! step. Any new commit clears the redo stack.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::DEFAULT_HISTORY_DEPTH;
use crate::doc::{Region, Scene};

/// An immutable copy of one region's scene at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub region: Region,
    pub scene: Scene,
}

/// Linear undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    /// Create an empty history keeping at most `max_depth` undo entries.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { undo_stack: VecDeque::new(), redo_stack: Vec::new(), max_depth: max_depth.max(1) }
    }

    /// Record the pre-mutation snapshot of a committed change.
    pub fn commit(&mut self, before: HistoryEntry) {
        self.undo_stack.push_back(before);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Step back. `current` is the live scene, which becomes the redo entry.
    ///
    /// Returns the snapshot to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(entry)
    }

    /// Step forward. `current` is the live scene, which becomes the undo entry.
    ///
    /// Returns the snapshot to restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(entry)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks, e.g. after a scene is loaded.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
