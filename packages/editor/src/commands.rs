//! # Commands
//!
//! Named editing operations, applied as a pure reducer:
//!
//! ```text
//! apply(state, command) -> state'
//! ```
//!
//! Every command clones the incoming state, applies its change, re-runs the
//! trailing-block normalization and places the caret at a deterministic
//! position. A rejected command leaves the caller's state untouched.
//!
//! ## Insertion point
//!
//! Block insertions target the top-level block holding the caret (the last
//! block when nothing is selected). An empty paragraph there is replaced;
//! anything else gets the new block inserted after it.

use crate::document::{Block, BlockKind, Document, Inline, InlineKind, Mark, Node, Text};
use crate::normalize::ensure_trailing_paragraph;
use crate::selection::{EditorState, Point, Selection};
use crate::table;
use crate::urls::{looks_like_url, UrlPredicate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default height of an inserted table, header row included
pub const DEFAULT_TABLE_ROWS: usize = 2;

/// Default width of an inserted table
pub const DEFAULT_TABLE_COLUMNS: usize = 2;

/// Hint character seeded into new equations
pub const DEFAULT_EQUATION_SEED: &str = "\\";

/// Text inserted by a link command on a collapsed selection
pub const DEFAULT_LINK_PLACEHOLDER: &str = "link";

/// Editing operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Empty paragraph after the block holding the caret
    InsertParagraph,

    /// Equation block seeded with the math hint character
    InsertEquation,

    /// Table with a header row
    InsertTable { rows: usize, columns: usize },

    InsertColumn { table: usize },
    RemoveColumn { table: usize },
    InsertRow { table: usize },
    RemoveRow { table: usize },
    SetTableHeadless { table: usize, headless: bool },
    RemoveTable { table: usize },

    /// Delete any top-level block
    RemoveBlock { block: usize },

    /// Void image block; `src` must look like a URL
    InsertImage { src: String },

    /// Wrap the selection in a link, or insert a placeholder link
    InsertLink { url: String },

    /// Unwrap the link around the caret
    RemoveLink,

    /// Add or remove a mark on the selected runs
    ToggleMark { mark: Mark },

    /// Type text at the caret
    InsertText { text: String },

    /// Line break inside the current run
    InsertSoftBreak,

    /// Move the caret
    Select { selection: Option<Selection> },
}

impl Command {
    /// Table with the default dimensions
    pub fn insert_table() -> Self {
        Command::InsertTable {
            rows: DEFAULT_TABLE_ROWS,
            columns: DEFAULT_TABLE_COLUMNS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::InsertParagraph => "insert_paragraph",
            Command::InsertEquation => "insert_equation",
            Command::InsertTable { .. } => "insert_table",
            Command::InsertColumn { .. } => "insert_column",
            Command::RemoveColumn { .. } => "remove_column",
            Command::InsertRow { .. } => "insert_row",
            Command::RemoveRow { .. } => "remove_row",
            Command::SetTableHeadless { .. } => "set_table_headless",
            Command::RemoveTable { .. } => "remove_table",
            Command::RemoveBlock { .. } => "remove_block",
            Command::InsertImage { .. } => "insert_image",
            Command::InsertLink { .. } => "insert_link",
            Command::RemoveLink => "remove_link",
            Command::ToggleMark { .. } => "toggle_mark",
            Command::InsertText { .. } => "insert_text",
            Command::InsertSoftBreak => "insert_soft_break",
            Command::Select { .. } => "select",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Please enter a valid URL: {0:?}")]
    InvalidUrl(String),

    #[error("Block index out of range: {0}")]
    BlockOutOfRange(usize),

    #[error("Block {0} is not a table")]
    NotATable(usize),

    #[error("Command requires a selection")]
    NoSelection,

    #[error("Selection spans more than one text node")]
    SelectionSpansNodes,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Caret is not inside a link")]
    NotInLink,
}

impl CommandError {
    /// Caller bugs, as opposed to bad user input
    pub fn is_precondition(&self) -> bool {
        !matches!(self, CommandError::InvalidUrl(_))
    }
}

/// Environment a command runs in
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub looks_like_url: UrlPredicate,
    pub equation_seed: String,
    pub link_placeholder: String,
}

impl Default for CommandContext {
    fn default() -> Self {
        Self {
            looks_like_url,
            equation_seed: DEFAULT_EQUATION_SEED.to_string(),
            link_placeholder: DEFAULT_LINK_PLACEHOLDER.to_string(),
        }
    }
}

/// Where the caret lands once a command finished
enum Focus {
    /// Previous selection, if it is still valid
    Keep,
    StartOf(Vec<usize>),
    At(Point),
    Set(Option<Selection>),
}

impl Focus {
    fn resolve(self, document: &Document, previous: Option<&Selection>) -> Option<Selection> {
        match self {
            Focus::Keep => previous
                .filter(|selection| selection.is_valid_in(document))
                .cloned(),
            Focus::StartOf(mut path) => {
                if let Some(first) = path.first_mut() {
                    *first = (*first).min(document.nodes.len().saturating_sub(1));
                }
                Point::start_of(document, &path)
                    .or_else(|| Point::start_of(document, &path[..1]))
                    .map(Selection::collapsed)
            }
            Focus::At(point) => Some(Selection::collapsed(point)),
            Focus::Set(selection) => selection,
        }
    }
}

/// Apply `command` with the default context
pub fn apply(state: &EditorState, command: &Command) -> Result<EditorState, CommandError> {
    apply_with(state, command, &CommandContext::default())
}

/// Apply `command` to a copy of `state`
pub fn apply_with(
    state: &EditorState,
    command: &Command,
    ctx: &CommandContext,
) -> Result<EditorState, CommandError> {
    let mut document = state.document.clone();
    let selection = state.selection.as_ref();

    let focus = match run(&mut document, selection, command, ctx) {
        Ok(focus) => focus,
        Err(e) => {
            if e.is_precondition() {
                warn!(command = command.name(), error = %e, "Command rejected");
            } else {
                debug!(command = command.name(), error = %e, "Command rejected");
            }
            return Err(e);
        }
    };

    ensure_trailing_paragraph(&mut document);
    let selection = focus.resolve(&document, selection);

    debug!(
        command = command.name(),
        blocks = document.nodes.len(),
        "Applied command"
    );

    Ok(EditorState {
        document,
        selection,
    })
}

fn run(
    document: &mut Document,
    selection: Option<&Selection>,
    command: &Command,
    ctx: &CommandContext,
) -> Result<Focus, CommandError> {
    match command {
        Command::InsertParagraph => {
            let index = selection
                .and_then(Selection::block_index)
                .map(|index| (index + 1).min(document.nodes.len()))
                .unwrap_or(document.nodes.len());
            document
                .nodes
                .insert(index, Node::Block(Block::empty_paragraph()));
            Ok(Focus::StartOf(vec![index]))
        }

        Command::InsertEquation => {
            let index = insert_block(document, selection, Block::equation(&ctx.equation_seed));
            Ok(Focus::At(Point::new(
                vec![index, 0],
                ctx.equation_seed.chars().count(),
            )))
        }

        Command::InsertTable { rows, columns } => {
            let index = insert_block(document, selection, table::new_table(*rows, *columns, false));
            Ok(Focus::StartOf(vec![index, 0, 0]))
        }

        Command::InsertColumn { table: index } => {
            let position = selection.and_then(|s| table::cell_position(&s.focus.path, *index));
            let block = grid_mut(document, *index)?;
            let at = match position {
                Some((_, column)) => column + 1,
                None => table::column_count(block),
            };
            table::insert_column(block, at);
            Ok(Focus::Keep)
        }

        Command::RemoveColumn { table: index } => {
            let position = selection.and_then(|s| table::cell_position(&s.focus.path, *index));
            let block = grid_mut(document, *index)?;
            let columns = table::column_count(block);
            let at = position.map(|(_, column)| column).unwrap_or(columns.saturating_sub(1));
            if !table::remove_column(block, at) {
                debug!(table = index, "Refusing to remove the last column");
                return Ok(Focus::Keep);
            }
            Ok(match position {
                Some((row, column)) => {
                    let column = column.min(table::column_count(block).saturating_sub(1));
                    Focus::StartOf(vec![*index, row, column])
                }
                None => Focus::Keep,
            })
        }

        Command::InsertRow { table: index } => {
            let position = selection.and_then(|s| table::cell_position(&s.focus.path, *index));
            let block = grid_mut(document, *index)?;
            let at = match position {
                Some((row, _)) => row + 1,
                None => table::row_count(block),
            };
            table::insert_row(block, at);
            Ok(Focus::Keep)
        }

        Command::RemoveRow { table: index } => {
            let position = selection.and_then(|s| table::cell_position(&s.focus.path, *index));
            let block = grid_mut(document, *index)?;
            let rows = table::row_count(block);
            let at = position.map(|(row, _)| row).unwrap_or(rows.saturating_sub(1));
            if !table::remove_row(block, at) {
                debug!(table = index, "Refusing to remove the last row");
                return Ok(Focus::Keep);
            }
            Ok(match position {
                Some((row, column)) => {
                    let row = row.min(table::row_count(block).saturating_sub(1));
                    Focus::StartOf(vec![*index, row, column])
                }
                None => Focus::Keep,
            })
        }

        Command::SetTableHeadless { table: index, headless } => {
            table_mut(document, *index)?.data.headless = Some(*headless);
            Ok(Focus::Keep)
        }

        Command::RemoveTable { table: index } => {
            table_mut(document, *index)?;
            document.nodes.remove(*index);
            Ok(Focus::StartOf(vec![*index]))
        }

        Command::RemoveBlock { block } => {
            if *block >= document.nodes.len() {
                return Err(CommandError::BlockOutOfRange(*block));
            }
            document.nodes.remove(*block);
            Ok(Focus::StartOf(vec![*block]))
        }

        Command::InsertImage { src } => {
            if !(ctx.looks_like_url)(src) {
                return Err(CommandError::InvalidUrl(src.clone()));
            }
            let index = insert_block(document, selection, Block::image(src));
            Ok(Focus::StartOf(vec![index + 1]))
        }

        Command::InsertLink { url } => {
            if !(ctx.looks_like_url)(url) {
                return Err(CommandError::InvalidUrl(url.clone()));
            }
            let selection = selection.ok_or(CommandError::NoSelection)?;
            wrap_in_link(document, selection, url, &ctx.link_placeholder)
        }

        Command::RemoveLink => {
            let selection = selection.ok_or(CommandError::NoSelection)?;
            unwrap_link(document, &selection.focus)
        }

        Command::ToggleMark { mark } => {
            let selection = selection.ok_or(CommandError::NoSelection)?;
            toggle_mark(document, selection, *mark);
            Ok(Focus::Keep)
        }

        Command::InsertText { text } => {
            let selection = selection.ok_or(CommandError::NoSelection)?;
            insert_text(document, selection, text)
        }

        Command::InsertSoftBreak => {
            let selection = selection.ok_or(CommandError::NoSelection)?;
            insert_text(document, selection, "\n")
        }

        Command::Select { selection } => {
            if let Some(selection) = selection {
                if !selection.is_valid_in(document) {
                    return Err(CommandError::InvalidSelection(format!(
                        "{:?} does not address the document",
                        selection.focus.path
                    )));
                }
            }
            Ok(Focus::Set(selection.clone()))
        }
    }
}

/// Insert a top-level block at the insertion point; returns its index
fn insert_block(document: &mut Document, selection: Option<&Selection>, block: Block) -> usize {
    if document.nodes.is_empty() {
        document.nodes.push(Node::Block(block));
        return 0;
    }

    let current = selection
        .and_then(Selection::block_index)
        .filter(|&index| index < document.nodes.len())
        .unwrap_or(document.nodes.len() - 1);

    let replace = document
        .block(current)
        .is_some_and(Block::is_empty_paragraph);

    if replace {
        document.nodes[current] = Node::Block(block);
        current
    } else {
        document.nodes.insert(current + 1, Node::Block(block));
        current + 1
    }
}

/// Table at `index` with ragged rows padded, so row and column edits see a
/// rectangular grid
fn grid_mut(document: &mut Document, index: usize) -> Result<&mut Block, CommandError> {
    let block = table_mut(document, index)?;
    let added = table::pad_rows(block);
    if added > 0 {
        debug!(table = index, cells = added, "Padded ragged table rows");
    }
    Ok(block)
}

fn table_mut(document: &mut Document, index: usize) -> Result<&mut Block, CommandError> {
    match document.nodes.get_mut(index) {
        None => Err(CommandError::BlockOutOfRange(index)),
        Some(Node::Block(block)) if block.kind == BlockKind::Table => Ok(block),
        Some(_) => Err(CommandError::NotATable(index)),
    }
}

/// Flip `mark` across the selection; the leading run decides the direction
fn toggle_mark(document: &mut Document, selection: &Selection, mark: Mark) {
    let start = selection.start().clone();
    let end = selection.end().clone();

    let ranges: Vec<(Vec<usize>, usize, usize)> = document
        .text_paths()
        .into_iter()
        .filter(|path| *path >= start.path && *path <= end.path)
        .filter_map(|path| {
            let len = document.node(&path)?.as_text()?.len();
            let from = if path == start.path { start.offset.min(len) } else { 0 };
            let to = if path == end.path { end.offset.min(len) } else { len };
            (from < to).then_some((path, from, to))
        })
        .collect();

    let Some((path, from, _)) = ranges.first() else {
        return;
    };

    let leading_has_mark = document
        .node(path)
        .and_then(Node::as_text)
        .and_then(|text| text.leaf_at(*from))
        .is_some_and(|leaf| leaf.marks.contains(&mark));

    for (path, from, to) in &ranges {
        if let Some(text) = document.node_mut(path).and_then(Node::as_text_mut) {
            text.set_mark(*from, *to, mark, !leading_has_mark);
        }
    }
}

/// Parent path and child index of a text point that may hold inline content
fn text_slot(document: &Document, point: &Point) -> Result<(Vec<usize>, usize), CommandError> {
    let (index, parent) = point
        .path
        .split_last()
        .ok_or_else(|| CommandError::InvalidSelection("empty path".to_string()))?;

    match document.node(&point.path) {
        Some(Node::Text(_)) => Ok((parent.to_vec(), *index)),
        Some(_) => Err(CommandError::InvalidSelection(
            "caret is not inside text".to_string(),
        )),
        None => Err(CommandError::InvalidSelection(format!(
            "{:?} does not address the document",
            point.path
        ))),
    }
}

/// Caret on a text container without text (an empty paragraph or cell)
/// gets an empty text child to type or link into
fn text_selection(document: &mut Document, selection: &Selection) -> Selection {
    match document.node_mut(&selection.focus.path) {
        Some(Node::Block(block)) if block.kind.holds_text() => {
            block.nodes.insert(0, Node::Text(Text::empty()));
            let mut path = selection.focus.path.clone();
            path.push(0);
            Selection::collapsed(Point::new(path, 0))
        }
        _ => selection.clone(),
    }
}

fn wrap_in_link(
    document: &mut Document,
    selection: &Selection,
    url: &str,
    placeholder: &str,
) -> Result<Focus, CommandError> {
    if !selection.is_single_node() {
        return Err(CommandError::SelectionSpansNodes);
    }
    let selection = &text_selection(document, selection);
    let start = selection.start().offset;
    let end = selection.end().offset;
    let (parent_path, index) = text_slot(document, &selection.focus)?;

    let parent_ok = !parent_path.is_empty()
        && matches!(
            document.node(&parent_path),
            Some(Node::Block(block)) if matches!(block.kind, BlockKind::Paragraph | BlockKind::TableCell)
        );
    if !parent_ok {
        return Err(CommandError::InvalidSelection(
            "links are only allowed in paragraphs and table cells".to_string(),
        ));
    }

    let text = document
        .node(&selection.focus.path)
        .and_then(Node::as_text)
        .cloned()
        .ok_or_else(|| CommandError::InvalidSelection("caret is not inside text".to_string()))?;
    let (before, rest) = text.split_at(start);
    let (selected, after) = rest.split_at(end.saturating_sub(start));
    let label = if start == end {
        Text::new(placeholder)
    } else {
        selected
    };
    let label_len = label.len();

    let mut replacement = Vec::new();
    if !before.is_empty() {
        replacement.push(Node::Text(before));
    }
    let link_index = index + replacement.len();
    replacement.push(Node::Inline(Inline::link(url, vec![Node::Text(label)])));
    if !after.is_empty() {
        replacement.push(Node::Text(after));
    }

    let siblings = document
        .children_mut(&parent_path)
        .ok_or_else(|| CommandError::InvalidSelection("missing parent".to_string()))?;
    siblings.splice(index..=index, replacement);

    let mut path = parent_path;
    path.extend([link_index, 0]);
    Ok(Focus::At(Point::new(path, label_len)))
}

fn unwrap_link(document: &mut Document, caret: &Point) -> Result<Focus, CommandError> {
    let depth = (1..caret.path.len())
        .rev()
        .find(|&depth| {
            matches!(
                document.node(&caret.path[..depth]),
                Some(Node::Inline(inline)) if inline.kind == InlineKind::Link
            )
        })
        .ok_or(CommandError::NotInLink)?;

    let link_path = caret.path[..depth].to_vec();
    let (link_index, parent_path) = link_path
        .split_last()
        .map(|(index, parent)| (*index, parent.to_vec()))
        .ok_or(CommandError::NotInLink)?;

    let siblings = document.children_mut(&parent_path).ok_or(CommandError::NotInLink)?;
    let children = match siblings.remove(link_index) {
        Node::Inline(link) => link.nodes,
        other => {
            siblings.insert(link_index, other);
            return Err(CommandError::NotInLink);
        }
    };
    siblings.splice(link_index..link_index, children);

    // The caret's child index inside the link becomes an offset among siblings
    let mut path = parent_path;
    path.push(link_index + caret.path[depth]);
    path.extend_from_slice(&caret.path[depth + 1..]);
    Ok(Focus::At(Point::new(path, caret.offset)))
}

fn insert_text(
    document: &mut Document,
    selection: &Selection,
    text: &str,
) -> Result<Focus, CommandError> {
    if !selection.is_single_node() {
        return Err(CommandError::SelectionSpansNodes);
    }
    let start = selection.start().offset;
    let end = selection.end().offset;
    let path = &selection.focus.path;
    let inserted = text.chars().count();

    match document.node_mut(path) {
        Some(Node::Text(node)) => {
            if end > start {
                node.remove_range(start, end);
            }
            let at = start.min(node.len());
            node.insert_text(at, text);
            Ok(Focus::At(Point::new(path.clone(), at + inserted)))
        }
        Some(Node::Block(block)) if block.kind.holds_text() => {
            block.nodes.insert(0, Node::Text(Text::new(text)));
            let mut path = path.clone();
            path.push(0);
            Ok(Focus::At(Point::new(path, inserted)))
        }
        Some(node) => Err(CommandError::InvalidSelection(format!(
            "cannot type into {}",
            node.node_type()
        ))),
        None => Err(CommandError::InvalidSelection(format!(
            "{:?} does not address the document",
            path
        ))),
    }
}
