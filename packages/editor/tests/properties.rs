//! Property tests over generated documents and command sequences

use atbd_editor::tables::{column_count, new_table, row_widths};
use atbd_editor::{
    apply, normalize, validate, Block, BlockKind, Command, Document, EditorState, Leaf, Mark, Node,
    Point, Selection, Text, Value,
};
use proptest::prelude::*;

fn arb_mark() -> impl Strategy<Value = Mark> {
    prop_oneof![Just(Mark::Bold), Just(Mark::Italic), Just(Mark::Underline)]
}

fn arb_leaf() -> impl Strategy<Value = Leaf> {
    ("[a-zα-γ ]{0,6}", prop::collection::vec(arb_mark(), 0..3))
        .prop_map(|(text, marks)| Leaf::with_marks(text, marks))
}

fn arb_text() -> impl Strategy<Value = Text> {
    prop::collection::vec(arb_leaf(), 1..4).prop_map(Text::from_leaves)
}

fn arb_block() -> impl Strategy<Value = Block> {
    prop_oneof![
        prop::collection::vec(arb_text().prop_map(Node::Text), 0..3).prop_map(Block::paragraph),
        "[a-z\\\\^]{0,8}".prop_map(Block::equation),
        "[a-z]{1,8}".prop_map(|name| Block::image(format!("https://example.com/{}.png", name))),
        (1usize..4, 1usize..4, any::<bool>())
            .prop_map(|(rows, columns, headless)| new_table(rows, columns, headless)),
    ]
}

fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(arb_block().prop_map(Node::Block), 0..5).prop_map(Document::new)
}

fn arb_table_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::insert_table()),
        (1usize..4, 1usize..4).prop_map(|(rows, columns)| Command::InsertTable { rows, columns }),
        (0usize..4).prop_map(|table| Command::InsertColumn { table }),
        (0usize..4).prop_map(|table| Command::RemoveColumn { table }),
        (0usize..4).prop_map(|table| Command::InsertRow { table }),
        (0usize..4).prop_map(|table| Command::RemoveRow { table }),
    ]
}

fn arb_content_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::InsertParagraph),
        Just(Command::InsertEquation),
        (0usize..4).prop_map(|block| Command::RemoveBlock { block }),
        "[a-z]{1,5}".prop_map(|text| Command::InsertText { text }),
        Just(Command::InsertSoftBreak),
        arb_mark().prop_map(|mark| Command::ToggleMark { mark }),
        "[a-z]{1,5}".prop_map(|name| Command::InsertImage {
            src: format!("https://example.com/{}.png", name)
        }),
        Just(Command::InsertImage {
            src: "not-a-url".to_string()
        }),
    ]
}

fn arb_selection_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        "[a-z]{1,5}".prop_map(|name| Command::InsertLink {
            url: format!("https://example.com/{}", name)
        }),
        Just(Command::RemoveLink),
        (0usize..4, any::<bool>())
            .prop_map(|(table, headless)| Command::SetTableHeadless { table, headless }),
        Just(Command::Select { selection: None }),
        (0usize..4, 0usize..3).prop_map(|(block, offset)| Command::Select {
            selection: Some(Selection::collapsed(Point::new(vec![block, 0], offset)))
        }),
        (0usize..4).prop_map(|block| Command::Select {
            selection: Some(Selection::collapsed(Point::new(vec![block], 0)))
        }),
    ]
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![arb_table_command(), arb_content_command(), arb_selection_command()]
}

/// Apply every command, skipping the rejected ones
fn run(commands: &[Command]) -> Vec<EditorState> {
    let mut states = vec![EditorState::new(Document::blank()).focus_start()];
    for command in commands {
        let current = states[states.len() - 1].clone();
        states.push(apply(&current, command).unwrap_or(current));
    }
    states
}

proptest! {
    #[test]
    fn normalization_is_idempotent(document in arb_document()) {
        let once = normalize(&document);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalized_documents_end_in_paragraph(document in arb_document()) {
        let normalized = normalize(&document);
        prop_assert!(normalized.nodes.last().is_some_and(|node| node.is_block(BlockKind::Paragraph)));
    }

    #[test]
    fn toggle_mark_twice_restores_run(
        leaf in arb_leaf(),
        mark in arb_mark(),
        bounds in (0usize..8, 0usize..8),
    ) {
        let len = leaf.len();
        prop_assume!(len > 0);
        let start = bounds.0 % len;
        let end = start + 1 + bounds.1 % (len - start);

        let document = Document::new(vec![Node::Block(Block::paragraph(vec![
            Node::Text(Text::from_leaves(vec![leaf])),
        ]))]);
        let state = EditorState::new(document)
            .with_selection(Selection::within(vec![0, 0], start, end));

        let toggle = Command::ToggleMark { mark };
        let once = apply(&state, &toggle).unwrap();
        let twice = apply(&once, &toggle).unwrap();

        prop_assert_eq!(twice.document, state.document);
    }

    #[test]
    fn insert_column_widens_every_row(rows in 1usize..5, columns in 1usize..5) {
        let state = EditorState::new(Document::new(vec![
            Node::Block(new_table(rows, columns, false)),
            Node::Block(Block::empty_paragraph()),
        ]));

        let next = apply(&state, &Command::InsertColumn { table: 0 }).unwrap();
        let table = next.document.block(0).unwrap();

        prop_assert_eq!(row_widths(table), vec![columns + 1; rows]);
    }

    #[test]
    fn remove_column_never_empties_a_table(rows in 1usize..5, removals in 1usize..6) {
        let mut state = EditorState::new(Document::new(vec![
            Node::Block(new_table(rows, 2, false)),
            Node::Block(Block::empty_paragraph()),
        ]));
        for _ in 0..removals {
            state = apply(&state, &Command::RemoveColumn { table: 0 }).unwrap();
        }

        prop_assert_eq!(column_count(state.document.block(0).unwrap()), 1);
    }

    #[test]
    fn command_sequences_keep_invariants(commands in prop::collection::vec(arb_command(), 0..24)) {
        for state in run(&commands) {
            prop_assert!(state
                .document
                .nodes
                .last()
                .is_some_and(|node| node.is_block(BlockKind::Paragraph)));
            let violations = validate(&state.document);
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
            if let Some(selection) = &state.selection {
                prop_assert!(selection.is_valid_in(&state.document));
            }
        }
    }

    #[test]
    fn command_sequences_round_trip(commands in prop::collection::vec(arb_command(), 0..24)) {
        let states = run(&commands);
        let value = Value::new(states[states.len() - 1].document.clone());

        let json = value.to_json().unwrap();
        prop_assert_eq!(Value::from_json(&json).unwrap(), value);
    }
}
