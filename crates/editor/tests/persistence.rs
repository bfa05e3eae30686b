mod common;

use common::{caret, journal};
use journaly_document::{Node, ValueError};
use journaly_editor::{DispatchError, EditorSettings, JournalEditor};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn post() -> Vec<Node> {
    vec![
        Node::element("heading-one", vec![Node::text("Day one")]),
        Node::element(
            "paragraph",
            vec![
                Node::text("see "),
                Node::link("https://example.com", vec![Node::text("this")]),
                Node::text(""),
            ],
        ),
        Node::image("data:image/png;base64,YWJj"),
    ]
}

#[test]
fn saved_posts_reopen_unchanged() {
    let editor = journal(post(), caret(&[1, 0], 2));

    let saved = editor.save().unwrap();
    let reopened = JournalEditor::load(&saved, EditorSettings::default()).unwrap();

    assert_eq!(reopened.doc(), editor.doc());
    assert_eq!(reopened.selection(), &caret(&[0, 0], 0));
    assert!(!reopened.editor().can_undo());
}

#[test]
fn legacy_bodies_are_saved_in_the_current_envelope() {
    let legacy = serde_json::to_string(&post()).unwrap();

    let mut editor = JournalEditor::load(&legacy, EditorSettings::default()).unwrap();
    editor.insert_text("Dear diary. ").unwrap();
    let saved: Value = serde_json::from_str(&editor.save().unwrap()).unwrap();

    assert_eq!(saved["schema"], "journaly");
    assert_eq!(saved["version"], 1);
    assert_eq!(
        saved["document"]["children"][0]["children"][0]["text"],
        "Dear diary. Day one"
    );
}

#[test]
fn bodies_from_newer_clients_are_refused() {
    let stored = r#"{ "schema": "journaly", "version": 2, "document": { "children": [] } }"#;

    let err = JournalEditor::load(stored, EditorSettings::default())
        .err()
        .unwrap();

    assert!(matches!(
        err,
        DispatchError::Document(ValueError::UnsupportedVersion { found: 2 })
    ));
}
