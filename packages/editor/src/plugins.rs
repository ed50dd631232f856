//! # Plugin Pipeline
//!
//! Input events and committed changes pass through an ordered list of
//! plugins before and after the command layer:
//!
//! ```text
//! input ─► on_input (each plugin) ─► apply command ─► on_change (each plugin) ─► state
//! ```
//!
//! The default order is fixed: `deep-table`, `soft-break`, `trailing-block`.
//! Deep-table runs first so Enter inside a cell never reaches the soft-break
//! rule.
//!
//! Hooks are pure: they take an [`Edit`] by value and hand back the next one.

use crate::commands::{apply_with, Command, CommandContext, CommandError};
use crate::document::{BlockKind, Document, Node};
use crate::normalize::ensure_trailing_paragraph;
use crate::selection::{EditorState, Point, Selection};
use crate::table;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Keys the plugins react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Enter,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: Key,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// Raw input handed to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    Command(Command),
    Key(KeyPress),
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}

impl From<KeyPress> for Input {
    fn from(key: KeyPress) -> Self {
        Input::Key(key)
    }
}

/// State plus the input still to be handled; `input` is `None` once consumed
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub state: EditorState,
    pub input: Option<Input>,
}

impl Edit {
    pub fn new(state: EditorState, input: Option<Input>) -> Self {
        Self { state, input }
    }

    fn with_input(self, input: Input) -> Self {
        Self {
            input: Some(input),
            ..self
        }
    }

    /// The pending key press, if the input is still an unhandled key
    fn key(&self) -> Option<KeyPress> {
        match self.input {
            Some(Input::Key(key)) => Some(key),
            _ => None,
        }
    }
}

pub trait Plugin: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Rewrite or consume input before it reaches the command layer
    fn on_input(&self, edit: Edit) -> Edit {
        edit
    }

    /// Repair state after a command ran
    fn on_change(&self, edit: Edit) -> Edit {
        edit
    }
}

/// Enter in a cell inserts a line break, Tab walks the cells, and every
/// change pads ragged rows
#[derive(Debug, Default)]
pub struct DeepTablePlugin;

impl DeepTablePlugin {
    /// `(table, row, column)` of the caret when it sits in a table cell
    fn caret_cell(state: &EditorState) -> Option<(usize, usize, usize)> {
        let focus = &state.selection.as_ref()?.focus;
        let table_index = focus.block_index()?;
        let block = state.document.block(table_index)?;
        if block.kind != BlockKind::Table {
            return None;
        }
        table::cell_position(&focus.path, table_index).map(|(row, column)| (table_index, row, column))
    }

    fn neighbour(
        document: &Document,
        (table_index, row, column): (usize, usize, usize),
        backwards: bool,
    ) -> Option<Vec<usize>> {
        let grid = document.block(table_index)?;
        let width = |row: usize| grid.nodes.get(row).map(|node| node.children().len());

        let (row, column) = if backwards {
            if column > 0 {
                (row, column - 1)
            } else {
                let previous = row.checked_sub(1)?;
                (previous, width(previous)?.checked_sub(1)?)
            }
        } else if column + 1 < width(row)? {
            (row, column + 1)
        } else {
            let next = row + 1;
            if width(next)? == 0 {
                return None;
            }
            (next, 0)
        };
        Some(vec![table_index, row, column])
    }
}

impl Plugin for DeepTablePlugin {
    fn name(&self) -> &'static str {
        "deep-table"
    }

    fn on_input(&self, edit: Edit) -> Edit {
        let Some(key) = edit.key() else {
            return edit;
        };
        let Some(cell) = Self::caret_cell(&edit.state) else {
            return edit;
        };

        match key.key {
            Key::Enter => {
                trace!(plugin = self.name(), "Enter inside table cell");
                edit.with_input(Input::Command(Command::InsertSoftBreak))
            }
            Key::Tab => {
                let target = Self::neighbour(&edit.state.document, cell, key.shift)
                    .and_then(|path| Point::start_of(&edit.state.document, &path));
                match target {
                    Some(point) => edit.with_input(Input::Command(Command::Select {
                        selection: Some(Selection::collapsed(point)),
                    })),
                    // no cell in that direction
                    None => Edit {
                        input: None,
                        ..edit
                    },
                }
            }
        }
    }

    fn on_change(&self, mut edit: Edit) -> Edit {
        for node in &mut edit.state.document.nodes {
            if let Node::Block(block) = node {
                if block.kind == BlockKind::Table {
                    let added = table::pad_rows(block);
                    if added > 0 {
                        debug!(plugin = self.name(), cells = added, "Padded ragged table rows");
                    }
                }
            }
        }
        edit
    }
}

/// Enter splits into a new paragraph; Shift+Enter inserts a line break
#[derive(Debug, Default)]
pub struct SoftBreakPlugin;

impl Plugin for SoftBreakPlugin {
    fn name(&self) -> &'static str {
        "soft-break"
    }

    fn on_input(&self, edit: Edit) -> Edit {
        match edit.key() {
            Some(KeyPress {
                key: Key::Enter,
                shift: true,
            }) => edit.with_input(Input::Command(Command::InsertSoftBreak)),
            Some(KeyPress {
                key: Key::Enter,
                shift: false,
            }) => edit.with_input(Input::Command(Command::InsertParagraph)),
            _ => edit,
        }
    }
}

/// Keeps an empty paragraph after a trailing table, equation or image
#[derive(Debug, Default)]
pub struct TrailingBlockPlugin;

impl Plugin for TrailingBlockPlugin {
    fn name(&self) -> &'static str {
        "trailing-block"
    }

    fn on_change(&self, mut edit: Edit) -> Edit {
        ensure_trailing_paragraph(&mut edit.state.document);
        edit
    }
}

/// Ordered plugins, fixed at construction
#[derive(Debug)]
pub struct PluginPipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginPipeline {
    /// The default plugin set
    pub fn new() -> Self {
        Self::with_plugins(vec![
            Box::new(DeepTablePlugin),
            Box::new(SoftBreakPlugin),
            Box::new(TrailingBlockPlugin),
        ])
    }

    pub fn with_plugins(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Run `input` through every plugin and the command layer
    pub fn run(
        &self,
        state: &EditorState,
        input: Input,
        ctx: &CommandContext,
    ) -> Result<EditorState, CommandError> {
        let edit = self
            .plugins
            .iter()
            .fold(Edit::new(state.clone(), Some(input)), |edit, plugin| {
                plugin.on_input(edit)
            });

        let changed = match edit.input {
            Some(Input::Command(command)) => apply_with(&edit.state, &command, ctx)?,
            Some(Input::Key(key)) => {
                trace!(?key, "Key not handled by any plugin");
                edit.state
            }
            None => edit.state,
        };

        Ok(self.settle(changed))
    }

    /// Run only the `on_change` hooks, e.g. on a freshly loaded document
    pub fn settle(&self, state: EditorState) -> EditorState {
        self.plugins
            .iter()
            .fold(Edit::new(state, None), |edit, plugin| plugin.on_change(edit))
            .state
    }
}

impl Default for PluginPipeline {
    fn default() -> Self {
        Self::new()
    }
}
