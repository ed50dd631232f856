//! Integration tests for editor crate

use atbd_editor::{
    is_blank, parse_path, render_html, validate, Command, Editor, EditorConfig, EditorError,
    FieldError, FieldKey, Key, KeyPress, Mark, MemoryStore, Node, Point, Selection, Value,
};

const PERSISTED: &str = r#"{
    "document": {
        "nodes": [
            {
                "object": "block",
                "type": "paragraph",
                "nodes": [
                    { "object": "text", "leaves": [ { "text": "Retrieval of ", "marks": [] } ] },
                    {
                        "object": "inline",
                        "type": "link",
                        "data": { "url": "https://earthdata.nasa.gov" },
                        "nodes": [ { "object": "text", "leaves": [ { "text": "aerosols", "marks": [ { "type": "italic" } ] } ] } ]
                    }
                ]
            }
        ]
    }
}"#;

fn key() -> FieldKey {
    FieldKey::new("atbd-12", "v1.1", "scientific_theory")
}

#[test]
fn test_document_lifecycle() {
    let mut editor = Editor::from_json(key(), Some(PERSISTED), EditorConfig::default()).required(true);

    assert!(!editor.is_blank());
    assert_eq!(editor.document().plain_text(), "Retrieval of aerosols");
    assert!(editor.violations().is_empty());

    // caret lands at the end of the field
    assert_eq!(
        editor.selection(),
        Some(&Selection::collapsed(Point::new(vec![0, 1, 0], 8)))
    );

    editor.dispatch(Command::InsertEquation).unwrap();
    editor
        .dispatch(Command::InsertText {
            text: "alpha".to_string(),
        })
        .unwrap();

    assert_eq!(editor.document().nodes.len(), 3);
    assert_eq!(editor.document().nodes[1].text(), "\\alpha");

    let mut store = MemoryStore::new();
    let saved = editor.save(&mut store).unwrap();

    let reloaded = Editor::load(key(), &store, EditorConfig::default()).unwrap();
    assert_eq!(reloaded.value(), saved);
}

#[test]
fn test_persisted_json_round_trips() {
    let value = Value::from_json(PERSISTED).unwrap();
    let json = value.to_json().unwrap();

    assert_eq!(Value::from_json(&json).unwrap(), value);
    assert!(json.contains(r#""marks":[{"type":"italic"}]"#));
}

#[test]
fn test_render_paths_resolve_to_model() {
    let editor = Editor::from_json(key(), Some(PERSISTED), EditorConfig::default());
    let html = render_html(editor.document());

    assert!(html.contains(r#"<a data-path="0.1" href="https://earthdata.nasa.gov">"#));
    assert!(html.contains("<em>aerosols</em>"));

    let path = parse_path("0.1.0").unwrap();
    match editor.document().node(&path) {
        Some(Node::Text(text)) => assert_eq!(text.text(), "aerosols"),
        other => panic!("Expected text node, got {:?}", other),
    }
}

#[test]
fn test_required_field_gating() {
    let mut editor = Editor::from_json(key(), None, EditorConfig::default()).required(true);
    let mut store = MemoryStore::new();

    match editor.save(&mut store) {
        Err(EditorError::Field(FieldError::Required { field })) => {
            assert_eq!(field, "scientific_theory")
        }
        other => panic!("Expected required-field error, got {:?}", other),
    }

    editor
        .dispatch(Command::InsertText {
            text: "Filled in".to_string(),
        })
        .unwrap();
    assert!(editor.save(&mut store).is_ok());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_malformed_field_starts_blank() {
    let editor = Editor::from_json(key(), Some("<html>"), EditorConfig::default());

    assert!(editor.is_blank());
    assert!(is_blank(editor.document()));
}

#[test]
fn test_invalid_image_url_keeps_state() {
    let mut editor = Editor::from_json(key(), Some(PERSISTED), EditorConfig::default());
    let before = editor.state().clone();

    let err = editor
        .dispatch(Command::InsertImage {
            src: "not a url".to_string(),
        })
        .unwrap_err();

    assert_eq!(err.to_string(), r#"Command error: Please enter a valid URL: "not a url""#);
    assert_eq!(editor.state(), &before);
    assert!(!editor.can_undo());
}

#[test]
fn test_formatting_and_enter() {
    let mut editor = Editor::from_json(key(), None, EditorConfig::default());
    editor
        .dispatch(Command::InsertText {
            text: "Title".to_string(),
        })
        .unwrap();
    editor
        .dispatch(Command::Select {
            selection: Some(Selection::within(vec![0, 0], 0, 5)),
        })
        .unwrap();
    editor.dispatch(Command::ToggleMark { mark: Mark::Bold }).unwrap();

    editor
        .dispatch(Command::Select {
            selection: Some(Selection::collapsed(Point::new(vec![0, 0], 5))),
        })
        .unwrap();
    editor.handle_key(KeyPress::new(Key::Enter)).unwrap();

    assert_eq!(editor.document().nodes.len(), 2);
    assert!(render_html(editor.document()).contains("<strong>Title</strong>"));
    assert!(validate(editor.document()).is_empty());
}

#[test]
fn test_link_in_blank_field() {
    let mut editor = Editor::from_json(key(), None, EditorConfig::default());
    assert_eq!(
        editor.selection(),
        Some(&Selection::collapsed(Point::new(vec![0], 0)))
    );

    editor
        .dispatch(Command::InsertLink {
            url: "https://example.com".to_string(),
        })
        .unwrap();

    assert_eq!(editor.document().plain_text(), "link");
    assert!(matches!(
        editor.document().node(&[0, 0]),
        Some(Node::Inline(_))
    ));
    assert_eq!(
        editor.selection(),
        Some(&Selection::collapsed(Point::new(vec![0, 0, 0], 4)))
    );
    assert!(editor.violations().is_empty());
}
