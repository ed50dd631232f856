//! # ATBD Editor
//!
//! Core of the rich-text field editor used to author Algorithm Theoretical
//! Basis Documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: persisted JSON ⇄ node tree        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ plugins: key presses → commands             │
//! │ commands: pure apply(state, command)        │
//! │ normalize: trailing paragraph               │
//! │ plugins: post-change repairs                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ render: node tree → HTML with data-path     │
//! │ schema / blank: gate saving the field       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One writer per field**: an [`Editor`] owns its document
//! 2. **Commands are pure**: a rejected command leaves the state untouched
//! 3. **Violations are reported**: only the trailing paragraph is auto-repaired
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atbd_editor::{Command, Editor, EditorConfig, FieldKey, MemoryStore};
//!
//! let key = FieldKey::new("42", "v1.0", "introduction");
//! let mut editor = Editor::from_json(key, persisted.as_deref(), EditorConfig::default())
//!     .required(true);
//!
//! editor.dispatch(Command::InsertText { text: "Hello".into() })?;
//! editor.insert_table()?;
//!
//! let mut store = MemoryStore::new();
//! editor.save(&mut store)?;
//! ```

mod blank;
mod commands;
mod config;
mod document;
mod errors;
mod field;
mod menus;
mod normalize;
mod plugins;
mod render;
mod schema;
mod selection;
mod session;
mod store;
mod table;
mod undo_stack;
mod urls;

pub use blank::is_blank;
pub use commands::{
    apply, apply_with, Command, CommandContext, CommandError, DEFAULT_EQUATION_SEED,
    DEFAULT_LINK_PLACEHOLDER, DEFAULT_TABLE_COLUMNS, DEFAULT_TABLE_ROWS,
};
pub use config::EditorConfig;
pub use document::{
    Block, BlockKind, Document, Inline, InlineKind, Leaf, Mark, MarkSet, ModelError, Node,
    NodeData, NodeType, Text, Value,
};
pub use errors::EditorError;
pub use field::{check_field, FieldError, FieldKey};
pub use menus::MenuRegistry;
pub use normalize::{ensure_trailing_paragraph, normalize};
pub use plugins::{
    DeepTablePlugin, Edit, Input, Key, KeyPress, Plugin, PluginPipeline, SoftBreakPlugin,
    TrailingBlockPlugin,
};
pub use render::{format_path, parse_path, render_html, render_html_with, PathError, RenderOptions};
pub use schema::{
    validate, validate_with, AttributeRule, ContentRule, Parent, Rule, RuleRegistry, SchemaRule,
    TableShapeRule, TrailingParagraphRule, Violation, VoidRule,
};
pub use selection::{EditorState, Point, Selection};
pub use session::Editor;
pub use store::{
    DirectoryStore, DocumentStore, FileUploader, MemoryStore, MemoryUploader, StoreError,
    UploadError,
};
pub use undo_stack::{HistoryEntry, UndoStack};
pub use urls::{looks_like_url, UrlPredicate};

/// Row/column helpers for `table` blocks
pub mod tables {
    pub use crate::table::{
        cell_position, column_count, insert_column, insert_row, is_headless, is_uniform, new_cell,
        new_row, new_table, pad_rows, remove_column, remove_row, row_count, row_widths,
    };
}
