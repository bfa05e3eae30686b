use journaly_document::{Document, Editor, Node, PluginRegistry, Point, Selection};
use pretty_assertions::assert_eq;

fn normalized(children: Vec<Node>) -> Vec<Node> {
    let editor = Editor::new(
        Document::new(children),
        Selection::collapsed(Point::new(vec![0, 0], 0)),
        PluginRegistry::journal(),
    );
    editor.doc().to_nodes()
}

fn cell(text: &str) -> Node {
    Node::element("td", vec![Node::paragraph(text)])
}

#[test]
fn empty_document_gets_a_paragraph() {
    assert_eq!(normalized(Vec::new()), vec![Node::paragraph("")]);
}

#[test]
fn orphan_list_items_are_wrapped() {
    let item = Node::element("list-item", vec![Node::text("x")]);
    assert_eq!(
        normalized(vec![item.clone()]),
        vec![Node::element("bulleted-list", vec![item])]
    );
}

#[test]
fn empty_list_containers_are_removed() {
    assert_eq!(
        normalized(vec![
            Node::paragraph("a"),
            Node::element("numbered-list", Vec::new()),
        ]),
        vec![Node::paragraph("a")]
    );
}

#[test]
fn inline_elements_are_padded_with_text() {
    let link = Node::link("https://example.com", vec![Node::text("x")]);
    assert_eq!(
        normalized(vec![Node::element("paragraph", vec![link.clone()])]),
        vec![Node::element(
            "paragraph",
            vec![Node::text(""), link, Node::text("")],
        )]
    );
}

#[test]
fn image_without_children_gets_an_empty_leaf() {
    let Node::Element(mut image) = Node::image("data:x") else {
        panic!("expected element");
    };
    image.children.clear();

    assert_eq!(
        normalized(vec![Node::Element(image)]),
        vec![Node::image("data:x")]
    );
}

#[test]
fn content_inside_an_image_is_reset() {
    let Node::Element(mut image) = Node::image("data:x") else {
        panic!("expected element");
    };
    image.children = vec![
        Node::text("q"),
        Node::link("https://a.io", vec![Node::text("a.io")]),
        Node::text(""),
    ];

    assert_eq!(
        normalized(vec![Node::paragraph("a"), Node::Element(image)]),
        vec![Node::paragraph("a"), Node::image("data:x")]
    );
}

#[test]
fn ragged_tables_are_padded() {
    let table = Node::element(
        "table",
        vec![
            Node::element("tr", vec![cell("a"), cell("b")]),
            Node::element("tr", vec![cell("c")]),
        ],
    );

    assert_eq!(
        normalized(vec![table]),
        vec![Node::element(
            "table",
            vec![
                Node::element("tr", vec![cell("a"), cell("b")]),
                Node::element("tr", vec![cell("c"), cell("")]),
            ],
        )]
    );
}

#[test]
fn duplicate_node_kinds_are_rejected() {
    let mut registry = PluginRegistry::journal();
    let err = registry
        .register_plugin(Box::new(DuplicateParagraph))
        .unwrap_err();
    assert!(err.contains("paragraph"));
}

struct DuplicateParagraph;

impl journaly_document::SchemaPlugin for DuplicateParagraph {
    fn id(&self) -> &'static str {
        "duplicate"
    }

    fn node_specs(&self) -> Vec<journaly_document::NodeSpec> {
        vec![journaly_document::NodeSpec {
            kind: "paragraph".to_string(),
            role: journaly_document::NodeRole::Block,
            is_void: false,
            children: journaly_document::ChildConstraint::InlineOnly,
        }]
    }
}
