//! Blank-document detection used by required-field validation.

use crate::document::{BlockKind, Document, Node};

/// Whether a document is still blank.
///
/// Heuristic: exactly one top-level paragraph whose first child is missing or
/// carries an empty text payload. Later children are not inspected, and
/// multi-block documents are never blank even when they only hold whitespace.
pub fn is_blank(document: &Document) -> bool {
    let [only] = document.nodes.as_slice() else {
        return false;
    };

    match only {
        Node::Block(block) if block.kind == BlockKind::Paragraph => match block.nodes.first() {
            None => true,
            Some(first) => first.text().is_empty(),
        },
        _ => false,
    }
}
