//! # Selection & Editor State
//!
//! A point addresses a node by its path from the document root plus a char
//! offset. Points normally sit in text nodes; blocks without any text child
//! (the canonical blank paragraph, an image) are addressed directly with
//! offset 0.

use crate::document::{Document, Node};
use serde::{Deserialize, Serialize};

/// Caret position
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// First position inside the node at `path`
    pub fn start_of(document: &Document, path: &[usize]) -> Option<Self> {
        let node = document.node(path)?;
        Some(match first_text(node) {
            Some(relative) => Point::new(join(path, &relative), 0),
            None => Point::new(path.to_vec(), 0),
        })
    }

    /// Last position inside the node at `path`
    pub fn end_of(document: &Document, path: &[usize]) -> Option<Self> {
        let node = document.node(path)?;
        Some(match last_text(node) {
            Some(relative) => {
                let full = join(path, &relative);
                let len = document
                    .node(&full)
                    .and_then(Node::as_text)
                    .map(|text| text.len())
                    .unwrap_or(0);
                Point::new(full, len)
            }
            None => Point::new(path.to_vec(), 0),
        })
    }

    /// Index of the top-level block containing this point
    pub fn block_index(&self) -> Option<usize> {
        self.path.first().copied()
    }

    /// Whether the point still addresses something in `document`
    pub fn is_valid_in(&self, document: &Document) -> bool {
        match document.node(&self.path) {
            Some(Node::Text(text)) => self.offset <= text.len(),
            Some(node) => self.offset == 0 && node.children().iter().all(|n| !matches!(n, Node::Text(_))),
            None => false,
        }
    }
}

fn join(prefix: &[usize], suffix: &[usize]) -> Vec<usize> {
    let mut path = prefix.to_vec();
    path.extend_from_slice(suffix);
    path
}

fn first_text(node: &Node) -> Option<Vec<usize>> {
    if let Node::Text(_) = node {
        return Some(Vec::new());
    }
    node.children().iter().enumerate().find_map(|(index, child)| {
        first_text(child).map(|mut rest| {
            rest.insert(0, index);
            rest
        })
    })
}

fn last_text(node: &Node) -> Option<Vec<usize>> {
    if let Node::Text(_) = node {
        return Some(Vec::new());
    }
    node.children().iter().enumerate().rev().find_map(|(index, child)| {
        last_text(child).map(|mut rest| {
            rest.insert(0, index);
            rest
        })
    })
}

/// Anchor/focus range; collapsed when both points match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Range inside a single node
    pub fn within(path: Vec<usize>, start: usize, end: usize) -> Self {
        Self::new(Point::new(path.clone(), start), Point::new(path, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Earlier point in document order
    pub fn start(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.anchor
        } else {
            &self.focus
        }
    }

    /// Later point in document order
    pub fn end(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.focus
        } else {
            &self.anchor
        }
    }

    /// Top-level block holding the focus
    pub fn block_index(&self) -> Option<usize> {
        self.focus.block_index()
    }

    /// Both ends lie in the same node
    pub fn is_single_node(&self) -> bool {
        self.anchor.path == self.focus.path
    }

    pub fn is_valid_in(&self, document: &Document) -> bool {
        self.anchor.is_valid_in(document) && self.focus.is_valid_in(document)
    }
}

/// Document plus the caret, the unit the command reducer works on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub document: Document,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Caret at the very start of the document
    pub fn focus_start(mut self) -> Self {
        self.selection = Point::start_of(&self.document, &[0]).map(Selection::collapsed);
        self
    }

    /// Caret at the very end of the document
    pub fn focus_end(mut self) -> Self {
        let last = self.document.nodes.len().saturating_sub(1);
        self.selection = Point::end_of(&self.document, &[last]).map(Selection::collapsed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Inline, Text};

    fn sample() -> Document {
        Document::new(vec![
            Node::Block(Block::paragraph(vec![
                Node::Text(Text::new("ab")),
                Node::Inline(Inline::link("https://x.org", vec![Node::Text(Text::new("cde"))])),
            ])),
            Node::Block(Block::image("https://x.org/a.png")),
            Node::Block(Block::paragraph(Vec::new())),
        ])
    }

    #[test]
    fn test_start_and_end_of_block() {
        let document = sample();

        assert_eq!(Point::start_of(&document, &[0]), Some(Point::new(vec![0, 0], 0)));
        assert_eq!(Point::end_of(&document, &[0]), Some(Point::new(vec![0, 1, 0], 3)));
        assert_eq!(Point::start_of(&document, &[1]), Some(Point::new(vec![1], 0)));
        assert_eq!(Point::start_of(&document, &[9]), None);
    }

    #[test]
    fn test_point_validity() {
        let document = sample();

        assert!(Point::new(vec![0, 0], 2).is_valid_in(&document));
        assert!(!Point::new(vec![0, 0], 3).is_valid_in(&document));
        assert!(Point::new(vec![2], 0).is_valid_in(&document));
        assert!(!Point::new(vec![0], 0).is_valid_in(&document));
    }

    #[test]
    fn test_selection_orders_points() {
        let backwards = Selection::new(Point::new(vec![0, 1, 0], 1), Point::new(vec![0, 0], 1));

        assert_eq!(backwards.start().path, vec![0, 0]);
        assert_eq!(backwards.end().path, vec![0, 1, 0]);
        assert!(!backwards.is_collapsed());
        assert!(!backwards.is_single_node());
    }
}
