use journaly_document::{Document, Editor, Marks, Node, PluginRegistry, Point, Selection};
use pretty_assertions::assert_eq;

fn bold() -> Marks {
    Marks::default().with("bold")
}

fn range(anchor: (&[usize], usize), focus: (&[usize], usize)) -> Selection {
    Selection::new(
        Point::new(anchor.0.to_vec(), anchor.1),
        Point::new(focus.0.to_vec(), focus.1),
    )
}

#[test]
fn adding_a_mark_splits_the_leaf_and_removing_it_merges_back() {
    let doc = Document::new(vec![Node::paragraph("hello world")]);
    let mut editor = Editor::new(
        doc,
        range((&[0, 0], 0), (&[0, 0], 5)),
        PluginRegistry::journal(),
    );

    editor.change("bold", |draft| draft.add_mark("bold")).unwrap();

    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::element(
            "paragraph",
            vec![Node::marked("hello", bold()), Node::text(" world")],
        )]
    );
    assert!(editor.marks().contains("bold"));

    editor
        .change("bold", |draft| draft.remove_mark("bold"))
        .unwrap();

    assert_eq!(editor.doc().to_nodes(), vec![Node::paragraph("hello world")]);
    assert!(!editor.marks().contains("bold"));
    assert_eq!(editor.selection(), &range((&[0, 0], 0), (&[0, 0], 5)));
}

#[test]
fn collapsed_mark_applies_to_the_next_typed_text() {
    let doc = Document::new(vec![Node::paragraph("hello")]);
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0, 0], 5)),
        PluginRegistry::journal(),
    );

    editor.change("bold", |draft| draft.add_mark("bold")).unwrap();
    assert!(editor.marks().contains("bold"));
    assert!(!editor.can_undo());

    editor
        .change("type", |draft| draft.insert_text("!"))
        .unwrap();

    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::element(
            "paragraph",
            vec![Node::text("hello"), Node::marked("!", bold())],
        )]
    );
    assert_eq!(editor.pending_marks(), None);
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![0, 1], 1))
    );
    assert!(editor.marks().contains("bold"));
}

#[test]
fn moving_the_caret_drops_pending_marks() {
    let mut editor = Editor::with_journal_plugins();
    editor
        .change("italic", |draft| draft.add_mark("italic"))
        .unwrap();
    assert!(editor.marks().contains("italic"));

    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 0)));
    assert!(!editor.marks().contains("italic"));
}

#[test]
fn caret_at_leaf_start_reports_previous_leaf_marks() {
    let doc = Document::new(vec![Node::element(
        "paragraph",
        vec![Node::marked("ab", bold()), Node::text("cd")],
    )]);
    let editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0, 1], 0)),
        PluginRegistry::journal(),
    );

    assert_eq!(editor.marks(), bold());
}

#[test]
fn marks_span_blocks_and_undo_as_one_step() {
    let doc = Document::new(vec![Node::paragraph("one"), Node::paragraph("two")]);
    let selection = range((&[0, 0], 1), (&[1, 0], 2));
    let mut editor = Editor::new(doc.clone(), selection.clone(), PluginRegistry::journal());
    let italic = Marks::default().with("italic");

    editor
        .change("italic", |draft| draft.add_mark("italic"))
        .unwrap();

    let marked = vec![
        Node::element(
            "paragraph",
            vec![Node::text("o"), Node::marked("ne", italic.clone())],
        ),
        Node::element(
            "paragraph",
            vec![Node::marked("tw", italic.clone()), Node::text("o")],
        ),
    ];
    assert_eq!(editor.doc().to_nodes(), marked);
    assert_eq!(editor.selection(), &range((&[0, 1], 0), (&[1, 0], 2)));
    assert_eq!(editor.marks(), italic);

    assert!(editor.undo());
    assert_eq!(editor.doc(), &doc);
    assert_eq!(editor.selection(), &selection);

    assert!(editor.redo());
    assert_eq!(editor.doc().to_nodes(), marked);
}
