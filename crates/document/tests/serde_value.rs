use journaly_document::{Document, DocumentValue, Marks, Node, ValueError};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn nodes_use_the_stored_post_shape() {
    let node = Node::element(
        "paragraph",
        vec![
            Node::marked("hi", Marks::default().with("bold")),
            Node::link("https://example.com", vec![Node::text("there")]),
        ],
    );

    assert_eq!(
        serde_json::to_value(&node).unwrap(),
        json!({
            "type": "paragraph",
            "children": [
                { "text": "hi", "bold": true },
                {
                    "type": "link",
                    "url": "https://example.com",
                    "children": [{ "text": "there" }]
                }
            ]
        })
    );
}

#[test]
fn false_marks_are_dropped_on_decode() {
    let node: Node =
        serde_json::from_value(json!({ "text": "x", "bold": false, "italic": true })).unwrap();

    assert_eq!(node, Node::marked("x", Marks::default().with("italic")));
}

#[test]
fn document_value_round_trips_and_defaults_its_header() {
    let doc = Document::new(vec![
        Node::element("heading-one", vec![Node::text("Day one")]),
        Node::image("data:image/png;base64,AAAA"),
    ]);
    let value = DocumentValue::from_document(doc.clone());
    assert_eq!(value.schema, "journaly");
    assert_eq!(value.version, 1);

    let json = value.to_json_pretty().unwrap();
    let decoded = DocumentValue::from_json_str(&json).unwrap();
    assert_eq!(decoded, value);

    let bare = r#"{ "document": { "children": [{ "type": "paragraph", "children": [{ "text": "a" }] }] } }"#;
    let decoded = DocumentValue::from_json_str(bare).unwrap();
    assert_eq!(decoded.schema, "journaly");
    assert_eq!(
        decoded.into_document().to_nodes(),
        vec![Node::paragraph("a")]
    );
}

#[test]
fn bare_node_arrays_load_as_legacy_bodies() {
    let stored = r#"[{ "type": "paragraph", "children": [{ "text": "old post" }] }]"#;

    let value = DocumentValue::from_json_str(stored).unwrap();

    assert!(value.is_legacy());
    assert_eq!(value.schema, "journaly");
    assert_eq!(
        value.into_document().to_nodes(),
        vec![Node::paragraph("old post")]
    );
}

#[test]
fn foreign_and_future_bodies_are_rejected() {
    let foreign = r#"{ "schema": "plate", "version": 1, "document": { "children": [] } }"#;
    assert!(matches!(
        DocumentValue::from_json_str(foreign),
        Err(ValueError::UnknownSchema(schema)) if schema == "plate"
    ));

    let future = r#"{ "version": 7, "document": { "children": [] } }"#;
    assert!(matches!(
        DocumentValue::from_json_str(future),
        Err(ValueError::UnsupportedVersion { found: 7 })
    ));

    assert!(matches!(
        DocumentValue::from_json_str("{ \"document\": 3 }"),
        Err(ValueError::Json(_))
    ));
}
