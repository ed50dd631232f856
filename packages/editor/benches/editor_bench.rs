use atbd_editor::tables::new_table;
use atbd_editor::{
    apply, normalize, render_html, validate, Block, Command, Document, EditorState, Inline, Leaf,
    Mark, Node, Selection, Text, Value,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn large_document() -> Document {
    // Simulate a long ATBD section: prose, equations, figures and tables
    let mut nodes = Vec::new();
    for i in 0..50 {
        nodes.push(Node::Block(Block::paragraph(vec![
            Node::Text(Text::from_leaves(vec![
                Leaf::new(format!("Paragraph {} describes the retrieval. ", i)),
                Leaf::with_marks("Aerosol optical depth", [Mark::Bold]),
                Leaf::new(" is derived from radiances."),
            ])),
            Node::Inline(Inline::link(
                "https://earthdata.nasa.gov",
                vec![Node::Text(Text::new("reference"))],
            )),
        ])));
        if i % 5 == 0 {
            nodes.push(Node::Block(Block::equation("\\tau = \\int_0^z \\beta(z') dz'")));
            nodes.push(Node::Block(Block::image(format!(
                "https://example.com/figure-{}.png",
                i
            ))));
        }
        if i % 10 == 0 {
            nodes.push(Node::Block(new_table(6, 4, false)));
        }
    }
    Document::new(nodes)
}

fn parse_persisted_value(c: &mut Criterion) {
    let json = Value::new(large_document())
        .to_json()
        .expect("serialize bench document");

    c.bench_function("parse_persisted_value", |b| {
        b.iter(|| Value::from_json(black_box(&json)))
    });
}

fn apply_typing(c: &mut Criterion) {
    let state = EditorState::new(large_document()).focus_end();
    let command = Command::InsertText {
        text: "x".to_string(),
    };

    c.bench_function("apply_insert_text", |b| {
        b.iter(|| apply(black_box(&state), black_box(&command)))
    });
}

fn apply_toggle_mark(c: &mut Criterion) {
    let state = EditorState::new(large_document())
        .with_selection(Selection::within(vec![0, 0], 4, 40));
    let command = Command::ToggleMark { mark: Mark::Italic };

    c.bench_function("apply_toggle_mark", |b| {
        b.iter(|| apply(black_box(&state), black_box(&command)))
    });
}

fn table_edits(c: &mut Criterion) {
    let state = EditorState::new(large_document());

    c.bench_function("insert_then_remove_column", |b| {
        b.iter(|| {
            let wider = apply(black_box(&state), &Command::InsertColumn { table: 3 })?;
            apply(&wider, &Command::RemoveColumn { table: 3 })
        })
    });
}

fn normalize_and_validate(c: &mut Criterion) {
    let document = large_document();

    c.bench_function("normalize", |b| b.iter(|| normalize(black_box(&document))));
    c.bench_function("validate", |b| b.iter(|| validate(black_box(&document))));
}

fn render(c: &mut Criterion) {
    let document = large_document();

    c.bench_function("render_html", |b| {
        b.iter(|| render_html(black_box(&document)))
    });
}

criterion_group!(
    benches,
    parse_persisted_value,
    apply_typing,
    apply_toggle_mark,
    table_edits,
    normalize_and_validate,
    render
);
criterion_main!(benches);
