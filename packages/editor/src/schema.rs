//! # Document Schema
//!
//! Validation of node nesting and attributes. Violations are reported, never
//! repaired here: callers decide whether to block a save or auto-fix. The one
//! generic repair lives in [`crate::normalize`].
//!
//! Rules are pluggable through [`SchemaRule`]; [`RuleRegistry::new`] holds the
//! built-in set.

use crate::document::{Block, BlockKind, Document, Inline, InlineKind, Node, NodeType};
use crate::table;
use crate::urls::{looks_like_url, UrlPredicate};
use serde::Serialize;
use std::fmt;

/// Container a node sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    Document,
    Block(BlockKind),
    Inline(InlineKind),
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Document => f.write_str("document"),
            Parent::Block(kind) => write!(f, "{} block", kind),
            Parent::Inline(kind) => write!(f, "{} inline", kind),
        }
    }
}

/// Broken schema rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Node not allowed at the top level
    DisallowedChild { child: NodeType },

    /// Node not allowed inside its parent block or inline
    WrongChildType { parent: Parent, child: NodeType },

    MissingAttribute { attribute: String },

    InvalidAttribute { attribute: String, value: String },

    VoidWithChildren { count: usize },

    /// Row width differs from the first row
    RaggedTable { row: usize, expected: usize, found: usize },

    EmptyTable,

    MissingTrailingParagraph,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::DisallowedChild { child } => write!(f, "{} is not allowed at the top level", child),
            Rule::WrongChildType { parent, child } => {
                write!(f, "{} cannot contain {}", parent, child)
            }
            Rule::MissingAttribute { attribute } => write!(f, "missing required attribute '{}'", attribute),
            Rule::InvalidAttribute { attribute, value } => {
                write!(f, "attribute '{}' has invalid value {:?}", attribute, value)
            }
            Rule::VoidWithChildren { count } => write!(f, "void node has {} children", count),
            Rule::RaggedTable { row, expected, found } => {
                write!(f, "row {} has {} cells, expected {}", row, found, expected)
            }
            Rule::EmptyTable => f.write_str("table has no cells"),
            Rule::MissingTrailingParagraph => f.write_str("document does not end in a paragraph"),
        }
    }
}

/// One schema problem, located by path (empty path = document root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: Vec<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeType>,

    #[serde(flatten)]
    pub rule: Rule,
}

impl Violation {
    pub fn new(path: &[usize], node: Option<NodeType>, rule: Rule) -> Self {
        Self {
            path: path.to_vec(),
            node,
            rule,
        }
    }

    pub fn at(path: &[usize], node: &Node, rule: Rule) -> Self {
        Self::new(path, Some(node.node_type()), rule)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(usize::to_string).collect();
        if path.is_empty() {
            write!(f, "document: {}", self.rule)
        } else {
            write!(f, "[{}]: {}", path.join("."), self.rule)
        }
    }
}

/// A schema rule checked against every node
pub trait SchemaRule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Check the document as a whole
    fn check_document(&self, _document: &Document) -> Vec<Violation> {
        Vec::new()
    }

    /// Check one node in the context of its parent
    fn check_node(&self, _path: &[usize], _node: &Node, _parent: Parent) -> Vec<Violation> {
        Vec::new()
    }
}

/// Allowed children per container
pub struct ContentRule;

impl ContentRule {
    fn allows(parent: Parent, child: &Node) -> bool {
        match parent {
            Parent::Document => matches!(
                child,
                Node::Block(Block {
                    kind: BlockKind::Paragraph | BlockKind::Image | BlockKind::Equation | BlockKind::Table,
                    ..
                })
            ),
            Parent::Block(BlockKind::Paragraph | BlockKind::TableCell) => {
                matches!(child, Node::Text(_) | Node::Inline(_))
            }
            Parent::Block(BlockKind::Equation) | Parent::Inline(InlineKind::Link) => {
                matches!(child, Node::Text(_))
            }
            Parent::Block(BlockKind::Table) => child.is_block(BlockKind::TableRow),
            Parent::Block(BlockKind::TableRow) => child.is_block(BlockKind::TableCell),
            // children of voids are reported by VoidRule
            Parent::Block(BlockKind::Image) => true,
        }
    }
}

impl SchemaRule for ContentRule {
    fn name(&self) -> &'static str {
        "content"
    }

    fn check_node(&self, path: &[usize], node: &Node, parent: Parent) -> Vec<Violation> {
        if Self::allows(parent, node) {
            return Vec::new();
        }
        let rule = match parent {
            Parent::Document => Rule::DisallowedChild {
                child: node.node_type(),
            },
            _ => Rule::WrongChildType {
                parent,
                child: node.node_type(),
            },
        };
        vec![Violation::at(path, node, rule)]
    }
}

/// Void blocks own no children
pub struct VoidRule;

impl SchemaRule for VoidRule {
    fn name(&self) -> &'static str {
        "void"
    }

    fn check_node(&self, path: &[usize], node: &Node, _parent: Parent) -> Vec<Violation> {
        match node {
            Node::Block(block) if block.kind.is_void() && !block.nodes.is_empty() => {
                vec![Violation::at(
                    path,
                    node,
                    Rule::VoidWithChildren {
                        count: block.nodes.len(),
                    },
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// Required attributes: image `src` (URL-shaped) and link `url`
pub struct AttributeRule {
    looks_like_url: UrlPredicate,
}

impl AttributeRule {
    pub fn new(looks_like_url: UrlPredicate) -> Self {
        Self { looks_like_url }
    }
}

impl Default for AttributeRule {
    fn default() -> Self {
        Self::new(looks_like_url)
    }
}

impl SchemaRule for AttributeRule {
    fn name(&self) -> &'static str {
        "attributes"
    }

    fn check_node(&self, path: &[usize], node: &Node, _parent: Parent) -> Vec<Violation> {
        let missing = |attribute: &str| {
            vec![Violation::at(
                path,
                node,
                Rule::MissingAttribute {
                    attribute: attribute.to_string(),
                },
            )]
        };

        match node {
            Node::Block(Block {
                kind: BlockKind::Image,
                data,
                ..
            }) => match &data.src {
                None => missing("src"),
                Some(src) if !(self.looks_like_url)(src) => vec![Violation::at(
                    path,
                    node,
                    Rule::InvalidAttribute {
                        attribute: "src".to_string(),
                        value: src.clone(),
                    },
                )],
                Some(_) => Vec::new(),
            },
            Node::Inline(Inline {
                kind: InlineKind::Link,
                data,
                ..
            }) if data.url.as_deref().map_or(true, str::is_empty) => missing("url"),
            _ => Vec::new(),
        }
    }
}

/// Tables are non-empty and rectangular
pub struct TableShapeRule;

impl SchemaRule for TableShapeRule {
    fn name(&self) -> &'static str {
        "table-shape"
    }

    fn check_node(&self, path: &[usize], node: &Node, _parent: Parent) -> Vec<Violation> {
        let Node::Block(block) = node else {
            return Vec::new();
        };
        if block.kind != BlockKind::Table {
            return Vec::new();
        }

        let widths = table::row_widths(block);
        if widths.iter().all(|&width| width == 0) {
            return vec![Violation::at(path, node, Rule::EmptyTable)];
        }

        let expected = widths[0];
        widths
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, found)| **found != expected)
            .map(|(row, found)| {
                Violation::at(
                    path,
                    node,
                    Rule::RaggedTable {
                        row,
                        expected,
                        found: *found,
                    },
                )
            })
            .collect()
    }
}

/// Document ends in a paragraph
pub struct TrailingParagraphRule;

impl SchemaRule for TrailingParagraphRule {
    fn name(&self) -> &'static str {
        "trailing-paragraph"
    }

    fn check_document(&self, document: &Document) -> Vec<Violation> {
        match document.nodes.last() {
            Some(node) if node.is_block(BlockKind::Paragraph) => Vec::new(),
            _ => vec![Violation::new(&[], None, Rule::MissingTrailingParagraph)],
        }
    }
}

/// Ordered set of schema rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn SchemaRule>>,
}

impl RuleRegistry {
    /// Registry with every built-in rule
    pub fn new() -> Self {
        Self::with_url_predicate(looks_like_url)
    }

    /// Built-in rules using a host-supplied URL predicate
    pub fn with_url_predicate(looks_like_url: UrlPredicate) -> Self {
        Self {
            rules: vec![
                Box::new(ContentRule),
                Box::new(VoidRule),
                Box::new(AttributeRule::new(looks_like_url)),
                Box::new(TableShapeRule),
                Box::new(TrailingParagraphRule),
            ],
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[Box<dyn SchemaRule>] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: Box<dyn SchemaRule>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

/// Validate with the built-in rules
pub fn validate(document: &Document) -> Vec<Violation> {
    validate_with(document, &RuleRegistry::new())
}

/// Validate with a custom registry
pub fn validate_with(document: &Document, registry: &RuleRegistry) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in registry.rules() {
        violations.extend(rule.check_document(document));
    }
    validate_nodes(&document.nodes, Parent::Document, &mut Vec::new(), registry, &mut violations);
    violations
}

fn validate_nodes(
    nodes: &[Node],
    parent: Parent,
    path: &mut Vec<usize>,
    registry: &RuleRegistry,
    violations: &mut Vec<Violation>,
) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        for rule in registry.rules() {
            violations.extend(rule.check_node(path, node, parent));
        }
        match node {
            Node::Block(block) => {
                validate_nodes(&block.nodes, Parent::Block(block.kind), path, registry, violations)
            }
            Node::Inline(inline) => {
                validate_nodes(&inline.nodes, Parent::Inline(inline.kind), path, registry, violations)
            }
            Node::Text(_) => {}
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NodeData, Text};

    fn paragraph(text: &str) -> Node {
        Node::Block(Block::paragraph(vec![Node::Text(Text::new(text))]))
    }

    #[test]
    fn test_valid_document_has_no_violations() {
        let document = Document::new(vec![
            paragraph("intro"),
            Node::Block(table::new_table(2, 2, false)),
            Node::Block(Block::image("https://example.com/a.png")),
            Node::Block(Block::equation("\\alpha")),
            paragraph(""),
        ]);

        assert!(validate(&document).is_empty());
    }

    #[test]
    fn test_reports_nested_block_in_paragraph() {
        let document = Document::new(vec![Node::Block(Block::paragraph(vec![Node::Block(
            Block::equation("x"),
        )]))]);

        let violations = validate(&document);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, vec![0, 0]);
        assert_eq!(
            violations[0].rule,
            Rule::WrongChildType {
                parent: Parent::Block(BlockKind::Paragraph),
                child: NodeType::Block(BlockKind::Equation),
            }
        );
    }

    #[test]
    fn test_reports_disallowed_top_level_node() {
        let document = Document::new(vec![Node::Text(Text::new("loose")), paragraph("")]);
        let violations = validate(&document);

        assert_eq!(
            violations,
            vec![Violation::new(
                &[0],
                Some(NodeType::Text),
                Rule::DisallowedChild { child: NodeType::Text }
            )]
        );
    }

    #[test]
    fn test_reports_void_with_children_and_bad_src() {
        let mut image = Block::image("not-a-url");
        image.nodes.push(Node::Text(Text::new("caption")));
        let document = Document::new(vec![Node::Block(image), paragraph("")]);

        let rules: Vec<Rule> = validate(&document).into_iter().map(|v| v.rule).collect();
        assert!(rules.contains(&Rule::VoidWithChildren { count: 1 }));
        assert!(rules.contains(&Rule::InvalidAttribute {
            attribute: "src".to_string(),
            value: "not-a-url".to_string(),
        }));
    }

    #[test]
    fn test_reports_missing_src() {
        let image = Block {
            kind: BlockKind::Image,
            data: NodeData::default(),
            nodes: vec![],
        };
        let document = Document::new(vec![Node::Block(image), paragraph("")]);

        assert_eq!(
            validate(&document)[0].rule,
            Rule::MissingAttribute {
                attribute: "src".to_string()
            }
        );
    }

    #[test]
    fn test_reports_ragged_table() {
        let mut grid = table::new_table(3, 2, false);
        if let Some(Node::Block(row)) = grid.nodes.get_mut(2) {
            row.nodes.pop();
        }
        let document = Document::new(vec![Node::Block(grid), paragraph("")]);

        assert_eq!(
            validate(&document)[0].rule,
            Rule::RaggedTable {
                row: 2,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_reports_missing_trailing_paragraph() {
        let document = Document::new(vec![Node::Block(Block::equation("x"))]);
        let violations = validate(&document);

        assert_eq!(violations, vec![Violation::new(&[], None, Rule::MissingTrailingParagraph)]);
        assert_eq!(violations[0].to_string(), "document: document does not end in a paragraph");
    }

    #[test]
    fn test_custom_registry() {
        struct NoEquations;

        impl SchemaRule for NoEquations {
            fn name(&self) -> &'static str {
                "no-equations"
            }

            fn check_node(&self, path: &[usize], node: &Node, _parent: Parent) -> Vec<Violation> {
                if node.is_block(BlockKind::Equation) {
                    vec![Violation::at(path, node, Rule::DisallowedChild { child: node.node_type() })]
                } else {
                    Vec::new()
                }
            }
        }

        let mut registry = RuleRegistry::empty();
        registry.add_rule(Box::new(NoEquations));
        let document = Document::new(vec![Node::Block(Block::equation("x"))]);

        assert_eq!(validate_with(&document, &registry).len(), 1);
        assert_eq!(format!("{:?}", registry), r#"RuleRegistry { rules: ["no-equations"] }"#);
    }
}
