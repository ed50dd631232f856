//! # Normalization Engine
//!
//! Repairs applied after every edit. The only generic repair is the
//! trailing-block rule: a document always ends in a paragraph so the caret can
//! be placed after a trailing table, equation or image.
//!
//! Structural problems (wrong nesting, ragged tables, bad attributes) are left
//! in place and reported by [`crate::schema::validate`].

use crate::document::{Block, BlockKind, Document, Node};
use tracing::trace;

/// Pure normalization: returns the repaired copy
pub fn normalize(document: &Document) -> Document {
    let mut normalized = document.clone();
    ensure_trailing_paragraph(&mut normalized);
    normalized
}

/// Append an empty paragraph unless the last top-level node is a paragraph.
///
/// Returns whether the document changed.
pub fn ensure_trailing_paragraph(document: &mut Document) -> bool {
    if document
        .nodes
        .last()
        .is_some_and(|node| node.is_block(BlockKind::Paragraph))
    {
        return false;
    }

    trace!(blocks = document.nodes.len(), "Appending trailing paragraph");
    document.nodes.push(Node::Block(Block::empty_paragraph()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Text;

    #[test]
    fn test_paragraph_last_is_untouched() {
        let document = Document::new(vec![
            Node::Block(Block::image("https://example.com/a.png")),
            Node::Block(Block::paragraph(vec![Node::Text(Text::new("end"))])),
        ]);

        assert_eq!(normalize(&document), document);
    }

    #[test]
    fn test_appends_paragraph_after_equation() {
        let document = Document::new(vec![Node::Block(Block::equation("\\"))]);
        let normalized = normalize(&document);

        assert_eq!(normalized.nodes.len(), 2);
        assert_eq!(normalized.nodes[1], Node::Block(Block::empty_paragraph()));
    }

    #[test]
    fn test_empty_document_gets_a_paragraph() {
        let normalized = normalize(&Document::default());

        assert_eq!(normalized.nodes, vec![Node::Block(Block::empty_paragraph())]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let document = Document::new(vec![Node::Block(Block::image("https://example.com/a.png"))]);
        let once = normalize(&document);

        assert_eq!(normalize(&once), once);
    }
}
