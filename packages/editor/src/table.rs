//! # Table Structure
//!
//! Row/column operations on `table` blocks. A table holds `table_row` blocks,
//! each holding `table_cell` blocks. Every operation here leaves all rows with
//! the same cell count.

use crate::document::{Block, BlockKind, Node, NodeData, Text};

pub fn new_cell() -> Block {
    Block::new(BlockKind::TableCell, vec![Node::Text(Text::empty())])
}

pub fn new_row(columns: usize) -> Block {
    Block::new(
        BlockKind::TableRow,
        (0..columns).map(|_| Node::Block(new_cell())).collect(),
    )
}

/// Table of `rows` × `columns` empty cells; the first row is the header
/// unless `headless`
pub fn new_table(rows: usize, columns: usize, headless: bool) -> Block {
    let rows = rows.max(1);
    let columns = columns.max(1);
    Block {
        kind: BlockKind::Table,
        data: NodeData {
            headless: Some(headless),
            ..NodeData::default()
        },
        nodes: (0..rows).map(|_| Node::Block(new_row(columns))).collect(),
    }
}

pub fn is_headless(table: &Block) -> bool {
    table.data.headless.unwrap_or(false)
}

fn rows(table: &Block) -> impl Iterator<Item = &Block> {
    table
        .nodes
        .iter()
        .filter_map(Node::as_block)
        .filter(|block| block.kind == BlockKind::TableRow)
}

fn rows_mut(table: &mut Block) -> impl Iterator<Item = &mut Block> {
    table
        .nodes
        .iter_mut()
        .filter_map(Node::as_block_mut)
        .filter(|block| block.kind == BlockKind::TableRow)
}

pub fn row_count(table: &Block) -> usize {
    rows(table).count()
}

/// Width of the widest row
pub fn column_count(table: &Block) -> usize {
    rows(table).map(|row| row.nodes.len()).max().unwrap_or(0)
}

/// Cell counts of every row
pub fn row_widths(table: &Block) -> Vec<usize> {
    rows(table).map(|row| row.nodes.len()).collect()
}

pub fn is_uniform(table: &Block) -> bool {
    let widths = row_widths(table);
    widths.windows(2).all(|pair| pair[0] == pair[1])
}

/// Insert an empty cell at `at` in every row (clamped to each row's end)
pub fn insert_column(table: &mut Block, at: usize) {
    for row in rows_mut(table) {
        let index = at.min(row.nodes.len());
        row.nodes.insert(index, Node::Block(new_cell()));
    }
}

/// Remove the cell at `at` from every row.
///
/// The last remaining column is never removed; returns whether anything
/// changed.
pub fn remove_column(table: &mut Block, at: usize) -> bool {
    if column_count(table) <= 1 {
        return false;
    }
    let mut changed = false;
    for row in rows_mut(table) {
        if row.nodes.len() > 1 {
            let index = at.min(row.nodes.len() - 1);
            row.nodes.remove(index);
            changed = true;
        }
    }
    changed
}

/// Insert an empty row before row `at` (clamped to the end)
pub fn insert_row(table: &mut Block, at: usize) {
    let columns = column_count(table).max(1);
    let index = row_node_index(table, at).unwrap_or(table.nodes.len());
    table.nodes.insert(index, Node::Block(new_row(columns)));
}

/// Remove row `at` (clamped to the last row).
///
/// The last remaining row is never removed; returns whether anything changed.
pub fn remove_row(table: &mut Block, at: usize) -> bool {
    let count = row_count(table);
    if count <= 1 {
        return false;
    }
    match row_node_index(table, at.min(count - 1)) {
        Some(index) => {
            table.nodes.remove(index);
            true
        }
        None => false,
    }
}

/// Pad short rows with empty cells until every row is as wide as the widest.
///
/// Returns the number of cells added.
pub fn pad_rows(table: &mut Block) -> usize {
    let columns = column_count(table);
    let mut added = 0;
    for row in rows_mut(table) {
        while row.nodes.len() < columns {
            row.nodes.push(Node::Block(new_cell()));
            added += 1;
        }
    }
    added
}

/// Child index of the `row`-th row block
fn row_node_index(table: &Block, row: usize) -> Option<usize> {
    table
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_block(BlockKind::TableRow))
        .nth(row)
        .map(|(index, _)| index)
}

/// `(row, column)` of a path inside the table at top-level index `table`
pub fn cell_position(path: &[usize], table: usize) -> Option<(usize, usize)> {
    match path {
        [t, row, column, ..] if *t == table => Some((*row, *column)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_dimensions() {
        let table = new_table(2, 3, false);

        assert_eq!(row_count(&table), 2);
        assert_eq!(column_count(&table), 3);
        assert!(!is_headless(&table));
        assert!(is_uniform(&table));
    }

    #[test]
    fn test_new_table_clamps_to_one_cell() {
        let table = new_table(0, 0, true);

        assert_eq!(row_widths(&table), vec![1]);
        assert!(is_headless(&table));
    }

    #[test]
    fn test_insert_and_remove_column() {
        let mut table = new_table(3, 2, false);

        insert_column(&mut table, 1);
        assert_eq!(row_widths(&table), vec![3, 3, 3]);

        assert!(remove_column(&mut table, 0));
        assert_eq!(row_widths(&table), vec![2, 2, 2]);
    }

    #[test]
    fn test_remove_last_column_is_noop() {
        let mut table = new_table(2, 1, false);
        let before = table.clone();

        assert!(!remove_column(&mut table, 0));
        assert_eq!(table, before);
    }

    #[test]
    fn test_remove_last_row_is_noop() {
        let mut table = new_table(1, 2, false);

        assert!(!remove_row(&mut table, 0));
        assert_eq!(row_count(&table), 1);
    }

    #[test]
    fn test_insert_row_uses_table_width() {
        let mut table = new_table(1, 4, false);
        insert_row(&mut table, 5);

        assert_eq!(row_widths(&table), vec![4, 4]);
    }

    #[test]
    fn test_pad_rows_fixes_ragged_table() {
        let mut table = new_table(2, 2, false);
        if let Some(Node::Block(row)) = table.nodes.get_mut(1) {
            row.nodes.pop();
        }
        assert!(!is_uniform(&table));

        assert_eq!(pad_rows(&mut table), 1);
        assert!(is_uniform(&table));
    }

    #[test]
    fn test_cell_position() {
        assert_eq!(cell_position(&[2, 1, 0, 0], 2), Some((1, 0)));
        assert_eq!(cell_position(&[2, 1, 0, 0], 3), None);
        assert_eq!(cell_position(&[2], 2), None);
    }
}
