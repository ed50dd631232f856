//! # Document Model
//!
//! Structured rich-text value of one editable field.
//!
//! The wire format is the Slate-style JSON persisted by the host application:
//!
//! ```text
//! { "document": { "nodes": [
//!     { "object": "block", "type": "paragraph", "nodes": [
//!         { "object": "text", "leaves": [ { "text": "Hi", "marks": [ { "type": "bold" } ] } ] }
//!     ] }
//! ] } }
//! ```
//!
//! Node kinds are closed enums so every consumer (validator, normalizer,
//! renderer, commands) matches them exhaustively. The tree itself may still
//! hold structurally invalid nesting (a table inside a paragraph, an image with
//! children); the schema validator reports those instead of the parser
//! rejecting them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Inline formatting attached to a text leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

impl Mark {
    pub const ALL: [Mark; 3] = [Mark::Bold, Mark::Italic, Mark::Underline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
        }
    }
}

impl FromStr for Mark {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bold" => Ok(Mark::Bold),
            "italic" => Ok(Mark::Italic),
            "underline" => Ok(Mark::Underline),
            other => Err(ModelError::UnknownMark(other.to_string())),
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marks on a leaf: a set, so duplicates and order never matter
pub type MarkSet = BTreeSet<Mark>;

/// Errors raised while decoding a persisted document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node object: {0}")]
    UnknownObject(String),

    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Unknown inline type: {0}")]
    UnknownInlineType(String),

    #[error("Unknown mark: {0}")]
    UnknownMark(String),

    #[error("Node is missing its type")]
    MissingType,
}

/// Block-level node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Table,
    TableRow,
    TableCell,
    Equation,
    Image,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Table => "table",
            BlockKind::TableRow => "table_row",
            BlockKind::TableCell => "table_cell",
            BlockKind::Equation => "equation",
            BlockKind::Image => "image",
        }
    }

    /// Void blocks never own children
    pub fn is_void(&self) -> bool {
        matches!(self, BlockKind::Image)
    }

    /// Blocks whose children are text-object nodes
    pub fn holds_text(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::TableCell | BlockKind::Equation
        )
    }
}

impl FromStr for BlockKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paragraph" => Ok(BlockKind::Paragraph),
            "table" => Ok(BlockKind::Table),
            "table_row" => Ok(BlockKind::TableRow),
            "table_cell" => Ok(BlockKind::TableCell),
            "equation" => Ok(BlockKind::Equation),
            "image" => Ok(BlockKind::Image),
            other => Err(ModelError::UnknownBlockType(other.to_string())),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineKind {
    Link,
}

impl InlineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InlineKind::Link => "link",
        }
    }
}

impl FromStr for InlineKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(InlineKind::Link),
            other => Err(ModelError::UnknownInlineType(other.to_string())),
        }
    }
}

impl fmt::Display for InlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node attributes carried in the `data` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Link target
    #[serde(default, alias = "href", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Table without a header row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
}

impl NodeData {
    pub fn is_empty(&self) -> bool {
        self.src.is_none() && self.url.is_none() && self.headless.is_none()
    }
}

/// A contiguous run of text sharing one set of marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,

    #[serde(default, with = "mark_objects")]
    pub marks: MarkSet,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self {
            text: text.into(),
            marks: marks.into_iter().collect(),
        }
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Marks persist as `[{"type": "bold"}, ...]`
mod mark_objects {
    use super::{Mark, MarkSet};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct MarkObject {
        #[serde(rename = "type")]
        kind: Mark,
    }

    pub fn serialize<S: Serializer>(marks: &MarkSet, serializer: S) -> Result<S::Ok, S::Error> {
        let objects: Vec<MarkObject> = marks.iter().map(|&kind| MarkObject { kind }).collect();
        objects.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MarkSet, D::Error> {
        let objects = Vec::<MarkObject>::deserialize(deserializer)?;
        Ok(objects.into_iter().map(|object| object.kind).collect())
    }
}

/// Text node: ordered leaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub leaves: Vec<Leaf>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            leaves: vec![Leaf::new(text)],
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn from_leaves(leaves: Vec<Leaf>) -> Self {
        let mut text = Self { leaves };
        text.canonicalize();
        text
    }

    /// Concatenated payload of all leaves
    pub fn text(&self) -> String {
        self.leaves.iter().map(|leaf| leaf.text.as_str()).collect()
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.leaves.iter().map(Leaf::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.iter().all(Leaf::is_empty)
    }

    /// Merge neighbouring leaves with equal marks and drop empty leaves.
    ///
    /// A text always keeps at least one leaf.
    pub fn canonicalize(&mut self) {
        let mut merged: Vec<Leaf> = Vec::with_capacity(self.leaves.len());
        for leaf in self.leaves.drain(..) {
            if leaf.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.marks == leaf.marks => last.text.push_str(&leaf.text),
                _ => merged.push(leaf),
            }
        }
        if merged.is_empty() {
            merged.push(Leaf::new(""));
        }
        self.leaves = merged;
    }

    /// Leaf covering the char at `offset`, if any
    pub fn leaf_at(&self, offset: usize) -> Option<&Leaf> {
        let mut start = 0;
        for leaf in &self.leaves {
            let end = start + leaf.len();
            if offset >= start && offset < end {
                return Some(leaf);
            }
            start = end;
        }
        None
    }

    /// Insert `text` at `offset`, inheriting the marks of the preceding char
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        let mut target = None;
        let mut start = 0;
        let last = self.leaves.len().saturating_sub(1);
        for (index, leaf) in self.leaves.iter().enumerate() {
            let end = start + leaf.len();
            let inside = if offset == 0 {
                index == 0
            } else {
                offset > start && offset <= end
            };
            if inside || index == last {
                target = Some((index, offset.saturating_sub(start).min(leaf.len())));
                break;
            }
            start = end;
        }

        match target {
            Some((index, chars)) => {
                let leaf = &mut self.leaves[index];
                let at = byte_index(&leaf.text, chars);
                leaf.text.insert_str(at, text);
            }
            None => self.leaves.push(Leaf::new(text)),
        }
        self.canonicalize();
    }

    /// Remove chars in `start..end`
    pub fn remove_range(&mut self, start: usize, end: usize) {
        let mut leaf_start = 0;
        for leaf in &mut self.leaves {
            let leaf_end = leaf_start + leaf.len();
            let from = start.max(leaf_start);
            let to = end.min(leaf_end);
            if from < to {
                let a = byte_index(&leaf.text, from - leaf_start);
                let b = byte_index(&leaf.text, to - leaf_start);
                leaf.text.replace_range(a..b, "");
            }
            leaf_start = leaf_end;
        }
        self.canonicalize();
    }

    /// Split into the parts before and after `offset`
    pub fn split_at(&self, offset: usize) -> (Text, Text) {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut start = 0;
        for leaf in &self.leaves {
            let end = start + leaf.len();
            if end <= offset {
                before.push(leaf.clone());
            } else if start >= offset {
                after.push(leaf.clone());
            } else {
                let at = byte_index(&leaf.text, offset - start);
                before.push(Leaf {
                    text: leaf.text[..at].to_string(),
                    marks: leaf.marks.clone(),
                });
                after.push(Leaf {
                    text: leaf.text[at..].to_string(),
                    marks: leaf.marks.clone(),
                });
            }
            start = end;
        }
        (Text::from_leaves(before), Text::from_leaves(after))
    }

    /// Add or remove `mark` on every char in `start..end`
    pub fn set_mark(&mut self, start: usize, end: usize, mark: Mark, enabled: bool) {
        if start >= end {
            return;
        }
        let (head, rest) = self.split_at(start);
        let (mut middle, tail) = rest.split_at(end - start);
        for leaf in &mut middle.leaves {
            if enabled {
                leaf.marks.insert(mark);
            } else {
                leaf.marks.remove(&mark);
            }
        }
        let mut leaves = head.leaves;
        leaves.extend(middle.leaves);
        leaves.extend(tail.leaves);
        self.leaves = leaves;
        self.canonicalize();
    }
}

/// Byte index of the `chars`-th char boundary
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Block node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub data: NodeData,
    pub nodes: Vec<Node>,
}

impl Block {
    pub fn new(kind: BlockKind, nodes: Vec<Node>) -> Self {
        Self {
            kind,
            data: NodeData::default(),
            nodes,
        }
    }

    /// Paragraph holding a single empty text run
    pub fn empty_paragraph() -> Self {
        Self::paragraph(vec![Node::Text(Text::empty())])
    }

    pub fn paragraph(nodes: Vec<Node>) -> Self {
        Self::new(BlockKind::Paragraph, nodes)
    }

    pub fn equation(source: impl Into<String>) -> Self {
        Self::new(BlockKind::Equation, vec![Node::Text(Text::new(source))])
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Image,
            data: NodeData {
                src: Some(src.into()),
                ..NodeData::default()
            },
            nodes: Vec::new(),
        }
    }

    pub fn is(&self, kind: BlockKind) -> bool {
        self.kind == kind
    }

    /// Paragraph without any text content
    pub fn is_empty_paragraph(&self) -> bool {
        self.kind == BlockKind::Paragraph
            && self.nodes.iter().all(|node| matches!(node, Node::Text(text) if text.is_empty()))
    }
}

/// Inline node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inline {
    pub kind: InlineKind,
    pub data: NodeData,
    pub nodes: Vec<Node>,
}

impl Inline {
    pub fn link(url: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            kind: InlineKind::Link,
            data: NodeData {
                url: Some(url.into()),
                ..NodeData::default()
            },
            nodes,
        }
    }
}

/// Any node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Node {
    Block(Block),
    Inline(Inline),
    Text(Text),
}

/// Node type as reported by validation and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "object", content = "type", rename_all = "lowercase")]
pub enum NodeType {
    Block(BlockKind),
    Inline(InlineKind),
    Text,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Block(kind) => write!(f, "{} block", kind),
            NodeType::Inline(kind) => write!(f, "{} inline", kind),
            NodeType::Text => f.write_str("text"),
        }
    }
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Block(block) => NodeType::Block(block.kind),
            Node::Inline(inline) => NodeType::Inline(inline.kind),
            Node::Text(_) => NodeType::Text,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Block(block) => &block.nodes,
            Node::Inline(inline) => &inline.nodes,
            Node::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Block(block) => Some(&mut block.nodes),
            Node::Inline(inline) => Some(&mut inline.nodes),
            Node::Text(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_block(&self, kind: BlockKind) -> bool {
        matches!(self, Node::Block(block) if block.kind == kind)
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        match self {
            Node::Text(text) => text.text(),
            Node::Block(_) | Node::Inline(_) => {
                self.children().iter().map(Node::text).collect()
            }
        }
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl From<Inline> for Node {
    fn from(inline: Inline) -> Self {
        Node::Inline(inline)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Persisted node shape; `object` may be omitted by older documents
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<NodeData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    nodes: Option<Vec<Node>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    leaves: Option<Vec<Leaf>>,
}

impl TryFrom<RawNode> for Node {
    type Error = ModelError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let object = match raw.object.as_deref() {
            Some(object) => object.to_string(),
            None if raw.leaves.is_some() => "text".to_string(),
            None if raw.kind.as_deref() == Some("link") => "inline".to_string(),
            None => "block".to_string(),
        };

        match object.as_str() {
            "text" => Ok(Node::Text(Text {
                leaves: raw.leaves.unwrap_or_default(),
            })),
            "block" => {
                let kind = raw.kind.ok_or(ModelError::MissingType)?.parse()?;
                Ok(Node::Block(Block {
                    kind,
                    data: raw.data.unwrap_or_default(),
                    nodes: raw.nodes.unwrap_or_default(),
                }))
            }
            "inline" => {
                let kind = raw.kind.ok_or(ModelError::MissingType)?.parse()?;
                Ok(Node::Inline(Inline {
                    kind,
                    data: raw.data.unwrap_or_default(),
                    nodes: raw.nodes.unwrap_or_default(),
                }))
            }
            other => Err(ModelError::UnknownObject(other.to_string())),
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let non_empty = |data: NodeData| (!data.is_empty()).then_some(data);
        match node {
            Node::Block(block) => RawNode {
                object: Some("block".to_string()),
                kind: Some(block.kind.as_str().to_string()),
                data: non_empty(block.data),
                nodes: Some(block.nodes),
                leaves: None,
            },
            Node::Inline(inline) => RawNode {
                object: Some("inline".to_string()),
                kind: Some(inline.kind.as_str().to_string()),
                data: non_empty(inline.data),
                nodes: Some(inline.nodes),
                leaves: None,
            },
            Node::Text(text) => RawNode {
                object: Some("text".to_string()),
                kind: None,
                data: None,
                nodes: None,
                leaves: Some(text.leaves),
            },
        }
    }
}

/// Root of the node tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Canonical blank document: one paragraph with no children
    pub fn blank() -> Self {
        Self {
            nodes: vec![Node::Block(Block::paragraph(Vec::new()))],
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.nodes.iter().filter_map(Node::as_block)
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.nodes.get(index).and_then(Node::as_block)
    }

    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.nodes.get_mut(index).and_then(Node::as_block_mut)
    }

    /// Node at `path` (indices from the root)
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for &index in rest {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for &index in rest {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Children of the node at `path`; the empty path is the document itself
    pub fn children_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.nodes);
        }
        self.node_mut(path)?.children_mut()
    }

    /// Paths of every text node, in document order
    pub fn text_paths(&self) -> Vec<Vec<usize>> {
        fn walk(nodes: &[Node], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            for (index, node) in nodes.iter().enumerate() {
                prefix.push(index);
                match node {
                    Node::Text(_) => out.push(prefix.clone()),
                    Node::Block(_) | Node::Inline(_) => walk(node.children(), prefix, out),
                }
                prefix.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut Vec::new(), &mut out);
        out
    }

    /// Plain text of the whole document, one line per top-level block
    pub fn plain_text(&self) -> String {
        self.nodes
            .iter()
            .map(Node::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Persisted value of a rich-text field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub document: Document,
}

impl Value {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn blank() -> Self {
        Self::new(Document::blank())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Decode a persisted field, falling back to the blank document when the
    /// field is absent or malformed
    pub fn from_json_or_blank(json: Option<&str>) -> Self {
        match json {
            None => Self::blank(),
            Some(json) => match Self::from_json(json) {
                Ok(value) if !value.document.nodes.is_empty() => value,
                Ok(_) => Self::blank(),
                Err(e) => {
                    warn!(error = %e, "Malformed document - starting from blank");
                    Self::blank()
                }
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}
