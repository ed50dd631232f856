//! # Node Renderers
//!
//! Maps the document tree to editable HTML. Every element produced for a node
//! carries `data-path="i.j.k"`, the node's path from the document root, so a
//! view event can be mapped back onto the model with [`parse_path`].
//!
//! ```text
//! paragraph  -> <p>
//! table      -> <table> (<thead> unless headless) <tbody>
//! equation   -> rendered math (read-only) + editable source
//! image      -> <img>
//! link       -> <a href>
//! marks      -> <strong> / <em> / <u>
//! soft break -> <br>
//! ```

use crate::document::{Block, BlockKind, Document, Inline, InlineKind, Leaf, Mark, Node, Text};
use crate::table;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty node path")]
    Empty,

    #[error("Invalid node path segment {segment:?} in {path:?}")]
    InvalidSegment { path: String, segment: String },
}

/// Options for HTML rendering
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Put every block element on its own indented line
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Emit `data-path` markers
    pub path_markers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            path_markers: true,
        }
    }
}

struct Context<'a> {
    options: &'a RenderOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn start_line(&mut self) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
    }

    fn end_line(&mut self) {
        if self.options.pretty {
            self.buffer.push('\n');
        }
    }

    fn add_line(&mut self, text: &str) {
        self.start_line();
        self.add(text);
        self.end_line();
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    /// ` data-path="…"` for `path`, or nothing when markers are off
    fn marker(&self, path: &[usize]) -> String {
        if self.options.path_markers {
            format!(" data-path=\"{}\"", format_path(path))
        } else {
            String::new()
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Render with the default options
pub fn render_html(document: &Document) -> String {
    render_html_with(document, &RenderOptions::default())
}

pub fn render_html_with(document: &Document, options: &RenderOptions) -> String {
    let mut ctx = Context::new(options);
    let mut path = Vec::new();
    for (index, node) in document.nodes.iter().enumerate() {
        path.push(index);
        render_top_level(node, &mut path, &mut ctx);
        path.pop();
    }
    ctx.get_output()
}

/// `[0, 1, 2]` -> `"0.1.2"`
pub fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// `"0.1.2"` -> `[0, 1, 2]`
pub fn parse_path(marker: &str) -> Result<Vec<usize>, PathError> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Err(PathError::Empty);
    }
    marker
        .split('.')
        .map(|segment| {
            segment.parse::<usize>().map_err(|_| PathError::InvalidSegment {
                path: marker.to_string(),
                segment: segment.to_string(),
            })
        })
        .collect()
}

fn render_top_level(node: &Node, path: &mut Vec<usize>, ctx: &mut Context) {
    match node {
        Node::Block(block) => render_block(block, path, ctx),
        // stray inline content gets its own line
        Node::Inline(_) | Node::Text(_) => {
            ctx.start_line();
            render_inline_content(node, path, ctx);
            ctx.end_line();
        }
    }
}

fn render_block(block: &Block, path: &mut Vec<usize>, ctx: &mut Context) {
    let marker = ctx.marker(path);
    match block.kind {
        BlockKind::Paragraph => {
            ctx.start_line();
            ctx.add(&format!("<p{}>", marker));
            render_children_inline(&block.nodes, path, ctx);
            ctx.add("</p>");
            ctx.end_line();
        }

        BlockKind::Equation => {
            let source = block.nodes.iter().map(Node::text).collect::<String>();
            ctx.add_line(&format!("<div class=\"equation\"{}>", marker));
            ctx.indent();
            ctx.add_line(&format!(
                "<span class=\"equation-rendering\" contenteditable=\"false\">{}</span>",
                escape_html(&source)
            ));
            ctx.start_line();
            ctx.add("<code class=\"equation-source\">");
            render_children_inline(&block.nodes, path, ctx);
            ctx.add("</code>");
            ctx.end_line();
            ctx.dedent();
            ctx.add_line("</div>");
        }

        BlockKind::Image => {
            let src = block.data.src.as_deref().unwrap_or_default();
            ctx.add_line(&format!(
                "<img{} src=\"{}\" contenteditable=\"false\" />",
                marker,
                escape_html(src)
            ));
        }

        BlockKind::Table => render_table(block, path, ctx),

        BlockKind::TableRow => render_row(block, "td", path, ctx),

        BlockKind::TableCell => render_cell(block, "td", path, ctx),
    }
}

fn render_table(block: &Block, path: &mut Vec<usize>, ctx: &mut Context) {
    let marker = ctx.marker(path);
    let class = if table::is_headless(block) {
        " class=\"headless\""
    } else {
        ""
    };
    ctx.add_line(&format!("<table{}{}>", class, marker));
    ctx.indent();

    let mut rows = block.nodes.iter().enumerate();
    if !table::is_headless(block) {
        if let Some((index, row)) = rows.next() {
            ctx.add_line("<thead>");
            ctx.indent();
            path.push(index);
            render_row_node(row, "th", path, ctx);
            path.pop();
            ctx.dedent();
            ctx.add_line("</thead>");
        }
    }

    ctx.add_line("<tbody>");
    ctx.indent();
    for (index, row) in rows {
        path.push(index);
        render_row_node(row, "td", path, ctx);
        path.pop();
    }
    ctx.dedent();
    ctx.add_line("</tbody>");

    ctx.dedent();
    ctx.add_line("</table>");
}

fn render_row_node(node: &Node, cell_tag: &str, path: &mut Vec<usize>, ctx: &mut Context) {
    match node {
        Node::Block(row) => render_row(row, cell_tag, path, ctx),
        other => render_top_level(other, path, ctx),
    }
}

fn render_row(row: &Block, cell_tag: &str, path: &mut Vec<usize>, ctx: &mut Context) {
    let marker = ctx.marker(path);
    ctx.add_line(&format!("<tr{}>", marker));
    ctx.indent();
    for (index, cell) in row.nodes.iter().enumerate() {
        path.push(index);
        match cell {
            Node::Block(block) if block.kind == BlockKind::TableCell => {
                render_cell(block, cell_tag, path, ctx)
            }
            Node::Block(block) => render_block(block, path, ctx),
            other => render_top_level(other, path, ctx),
        }
        path.pop();
    }
    ctx.dedent();
    ctx.add_line("</tr>");
}

fn render_cell(cell: &Block, tag: &str, path: &mut Vec<usize>, ctx: &mut Context) {
    let marker = ctx.marker(path);
    ctx.start_line();
    ctx.add(&format!("<{}{}>", tag, marker));
    render_children_inline(&cell.nodes, path, ctx);
    ctx.add(&format!("</{}>", tag));
    ctx.end_line();
}

fn render_children_inline(nodes: &[Node], path: &mut Vec<usize>, ctx: &mut Context) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        render_inline_content(node, path, ctx);
        path.pop();
    }
}

/// Text-level rendering; misplaced blocks fall back to a `<span>` of their text
fn render_inline_content(node: &Node, path: &mut Vec<usize>, ctx: &mut Context) {
    let marker = ctx.marker(path);
    match node {
        Node::Text(text) => render_text(text, &marker, ctx),
        Node::Inline(inline) => render_inline(inline, &marker, path, ctx),
        Node::Block(block) => {
            ctx.add(&format!(
                "<span class=\"{}\"{}>{}</span>",
                block.kind,
                marker,
                escape_html(&node.text())
            ));
        }
    }
}

fn render_inline(inline: &Inline, marker: &str, path: &mut Vec<usize>, ctx: &mut Context) {
    match inline.kind {
        InlineKind::Link => {
            let href = inline.data.url.as_deref().unwrap_or_default();
            ctx.add(&format!("<a{} href=\"{}\">", marker, escape_html(href)));
            render_children_inline(&inline.nodes, path, ctx);
            ctx.add("</a>");
        }
    }
}

fn render_text(text: &Text, marker: &str, ctx: &mut Context) {
    ctx.add(&format!("<span{}>", marker));
    for leaf in &text.leaves {
        render_leaf(leaf, ctx);
    }
    ctx.add("</span>");
}

fn render_leaf(leaf: &Leaf, ctx: &mut Context) {
    for mark in &leaf.marks {
        ctx.add(&format!("<{}>", mark_tag(*mark)));
    }
    let lines: Vec<String> = leaf.text.split('\n').map(escape_html).collect();
    ctx.add(&lines.join("<br>"));
    for mark in leaf.marks.iter().rev() {
        ctx.add(&format!("</{}>", mark_tag(*mark)));
    }
}

fn mark_tag(mark: Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Underline => "u",
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
