//! # Undo/Redo Stack
//!
//! Tracks edit history as state snapshots and enables undo/redo.
//!
//! ## Design
//!
//! - Each recorded edit keeps the state before and after it
//! - Undo restores the "before" snapshot and moves the entry to the redo stack
//! - Redo restores the "after" snapshot
//! - New edits clear the redo stack
//! - Batches group several edits into one undo step (the first "before" and
//!   the last "after" are kept)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//!
//! let next = apply(&state, &command)?;
//! stack.record(state, next.clone(), command.name());
//!
//! let restored = stack.undo().unwrap();
//! ```

use crate::selection::EditorState;

/// One undo step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub before: EditorState,
    pub after: EditorState,

    /// Optional description of this step
    pub description: Option<String>,
}

impl HistoryEntry {
    pub fn new(before: EditorState, after: EditorState) -> Self {
        Self {
            before,
            after,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo stack for one editor
#[derive(Debug)]
pub struct UndoStack {
    /// Applied steps (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone steps (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    batching: bool,
    current_batch: Option<HistoryEntry>,
    batch_description: Option<String>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            batching: false,
            current_batch: None,
            batch_description: None,
        }
    }

    /// Record an edit that turned `before` into `after`
    pub fn record(&mut self, before: EditorState, after: EditorState, description: &str) {
        if self.batching {
            match &mut self.current_batch {
                Some(batch) => batch.after = after,
                None => self.current_batch = Some(HistoryEntry::new(before, after)),
            }
            return;
        }
        self.push_entry(HistoryEntry::new(before, after).with_description(description));
    }

    /// Start a batch (recorded edits will be undone/redone together)
    pub fn begin_batch(&mut self) {
        self.batching = true;
        self.current_batch = None;
        self.batch_description = None;
    }

    /// End the current batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        self.batching = false;
        if let Some(mut batch) = self.current_batch.take() {
            batch.description = self.batch_description.take();
            self.push_entry(batch);
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batching
    }

    /// Set description for current batch (if batching)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if self.batching {
            self.batch_description = Some(description.into());
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // new action invalidates the future
        self.redo_stack.clear();
    }

    /// Undo the most recent step; returns the state to restore
    pub fn undo(&mut self) -> Option<EditorState> {
        let entry = self.undo_stack.pop()?;
        let state = entry.before.clone();
        self.redo_stack.push(entry);
        Some(state)
    }

    /// Redo the most recently undone step; returns the state to restore
    pub fn redo(&mut self) -> Option<EditorState> {
        let entry = self.redo_stack.pop()?;
        let state = entry.after.clone();
        self.undo_stack.push(entry);
        Some(state)
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

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batching = false;
        self.current_batch = None;
        self.batch_description = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document, Node, Text};

    fn state(text: &str) -> EditorState {
        EditorState::new(Document::new(vec![Node::Block(Block::paragraph(vec![
            Node::Text(Text::new(text)),
        ]))]))
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_record_undo_redo() {
        let mut stack = UndoStack::new();
        stack.record(state("a"), state("ab"), "insert_text");

        assert_eq!(stack.undo_description(), Some("insert_text"));
        assert_eq!(stack.undo(), Some(state("a")));
        assert_eq!(stack.redo_levels(), 1);
        assert_eq!(stack.redo(), Some(state("ab")));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo(), None);
    }

    #[test]
    fn test_batched_edits_undo_together() {
        let mut stack = UndoStack::new();

        stack.begin_batch();
        stack.set_batch_description("Type greeting");
        stack.record(state(""), state("H"), "insert_text");
        stack.record(state("H"), state("Hi"), "insert_text");
        stack.end_batch();

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("Type greeting"));
        assert_eq!(stack.undo(), Some(state("")));
        assert_eq!(stack.redo(), Some(state("Hi")));
    }

    #[test]
    fn test_empty_batch_records_nothing() {
        let mut stack = UndoStack::new();
        stack.begin_batch();
        stack.end_batch();

        assert!(!stack.can_undo());
        assert!(!stack.is_batching());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(state("a"), state("b"), "insert_text");
        stack.undo();
        assert_eq!(stack.redo_levels(), 1);

        stack.record(state("a"), state("c"), "insert_text");
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..3 {
            stack.record(state(&i.to_string()), state(&(i + 1).to_string()), "insert_text");
        }

        assert_eq!(stack.undo_levels(), 2);
        assert_eq!(stack.undo(), Some(state("2")));
        assert_eq!(stack.undo(), Some(state("1")));
        assert_eq!(stack.undo(), None);
    }
}
