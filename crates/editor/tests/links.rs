mod common;

use common::{ScriptedHost, caret, journal, range};
use futures::executor::block_on;
use journaly_document::Node;
use journaly_editor::{
    Catalog, Command, CommandKind, EditorSettings, JournalEditor, MessageKey, Outcome,
};
use pretty_assertions::assert_eq;

fn linked(url: &str) -> Vec<Node> {
    vec![Node::element(
        "paragraph",
        vec![
            Node::text(""),
            Node::link(url, vec![Node::text(url)]),
            Node::text(""),
        ],
    )]
}

#[test]
fn empty_prompt_changes_nothing() {
    for answer in [Some(""), None] {
        let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));
        let host = ScriptedHost::answering(answer);

        let outcome = block_on(editor.toggle(&Command::link(), &host)).unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(editor.doc().to_nodes(), vec![Node::paragraph("")]);
        assert!(host.errors().is_empty());
        assert!(!editor.editor().can_undo());
    }
}

#[test]
fn bare_domain_gets_https_and_is_inserted_at_the_caret() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));
    let host = ScriptedHost::answering(Some("example.com"));

    let outcome = block_on(editor.toggle(&Command::link(), &host)).unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(host.prompts(), vec!["Enter the URL of the link:".to_string()]);
    assert_eq!(editor.doc().to_nodes(), linked("https://example.com"));
    assert!(editor.is_active(CommandKind::Link, "link"));
}

#[test]
fn invalid_url_is_reported_and_nothing_changes() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));
    let host = ScriptedHost::answering(Some("not a url"));

    let outcome = block_on(editor.toggle(&Command::link(), &host)).unwrap();

    assert_eq!(outcome, Outcome::InvalidUrl);
    assert_eq!(host.errors(), vec!["Please enter a valid URL".to_string()]);
    assert_eq!(editor.doc().to_nodes(), vec![Node::paragraph("")]);
}

#[test]
fn messages_come_from_the_settings_catalog() {
    let settings = EditorSettings {
        messages: Catalog::new()
            .with(MessageKey::EnterUrlPrompt, "Introduce la URL:")
            .with(MessageKey::WebsitePatternError, "URL no válida"),
        ..EditorSettings::default()
    };
    let mut editor = JournalEditor::new(
        journaly_document::Document::new(vec![Node::paragraph("")]),
        caret(&[0, 0], 0),
        settings,
    );
    let host = ScriptedHost::answering(Some("bad url"));

    block_on(editor.toggle(&Command::link(), &host)).unwrap();

    assert_eq!(host.prompts(), vec!["Introduce la URL:".to_string()]);
    assert_eq!(host.errors(), vec!["URL no válida".to_string()]);
}

#[test]
fn custom_localizer_wins_and_falls_back_per_key() {
    let editor = JournalEditor::default().with_localizer(|key: MessageKey| {
        (key == MessageKey::EnterUrlPrompt).then(|| "Adresse du lien :".to_string())
    });

    assert_eq!(editor.message(MessageKey::EnterUrlPrompt), "Adresse du lien :");
    assert_eq!(
        editor.message(MessageKey::WebsitePatternError),
        "Please enter a valid URL"
    );
}

#[test]
fn supplied_text_skips_the_prompt() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));
    let host = ScriptedHost::default();

    let command = Command::link().with_text("http://localhost:3000");
    block_on(editor.toggle(&command, &host)).unwrap();

    assert!(host.prompts().is_empty());
    assert_eq!(editor.doc().to_nodes(), linked("http://localhost:3000"));
}

#[test]
fn range_is_wrapped_and_caret_lands_at_its_end() {
    let mut editor = journal(vec![Node::paragraph("visit my blog")], range(&[0, 0], 9, 13));
    let host = ScriptedHost::answering(Some("journaly.app"));

    block_on(editor.toggle(&Command::link(), &host)).unwrap();

    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::element(
            "paragraph",
            vec![
                Node::text("visit my "),
                Node::link("https://journaly.app", vec![Node::text("blog")]),
                Node::text(""),
            ],
        )]
    );
    assert_eq!(editor.selection(), &caret(&[0, 1, 0], 4));
}

#[test]
fn toggling_inside_a_link_removes_it() {
    let mut editor = journal(linked("https://example.com"), caret(&[0, 1, 0], 3));
    let host = ScriptedHost::default();

    let outcome = block_on(editor.toggle(&Command::link(), &host)).unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert!(host.prompts().is_empty());
    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::paragraph("https://example.com")]
    );
    assert!(!editor.is_active(CommandKind::Link, "link"));
}

#[test]
fn typed_url_becomes_a_link() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));

    editor.insert_text("http://foo.com").unwrap();

    assert_eq!(editor.doc().to_nodes(), linked("http://foo.com"));
}

#[test]
fn typed_words_stay_plain_text() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));

    editor.insert_text("foo.com is nice").unwrap();
    assert_eq!(editor.insert_text("").unwrap(), Outcome::Ignored);

    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::paragraph("foo.com is nice")]
    );
}

#[test]
fn typing_after_a_typed_url_continues_outside_the_link() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));

    editor.insert_text("http://foo.com").unwrap();
    editor.insert_text(" is down").unwrap();

    assert_eq!(
        editor.doc().to_nodes(),
        vec![Node::element(
            "paragraph",
            vec![
                Node::text(""),
                Node::link("http://foo.com", vec![Node::text("http://foo.com")]),
                Node::text(" is down"),
            ],
        )]
    );
}

#[test]
fn typed_protocol_relative_url_becomes_a_link() {
    let mut editor = journal(vec![Node::paragraph("")], caret(&[0, 0], 0));

    editor.insert_text("//foo.com/today").unwrap();

    assert_eq!(editor.doc().to_nodes(), linked("//foo.com/today"));
}
