use journaly_document::{
    ApplyError, Document, DocumentValue, Draft, Edge, Editor, IMAGE, LINK, Node, PARAGRAPH,
    PluginRegistry, Point, Selection, TABLE, first_text_point, is_list_container,
};

use crate::command::{Command, CommandKind, INSERT_TABLE, is_list_type};
use crate::error::{DispatchError, Outcome};
use crate::host::Host;
use crate::image::{DataTransfer, FileHandle, is_image_mime, read_data_url};
use crate::link::{is_url, with_protocol};
use crate::locale::{Localizer, MessageKey};
use crate::settings::EditorSettings;

/// Command layer over a journal [`Editor`].
pub struct JournalEditor {
    editor: Editor,
    settings: EditorSettings,
    localizer: Option<Box<dyn Localizer>>,
}

impl Default for JournalEditor {
    fn default() -> Self {
        Self::new(
            Document::new(vec![Node::paragraph("")]),
            Selection::collapsed(Point::new(vec![0, 0], 0)),
            EditorSettings::default(),
        )
    }
}

impl JournalEditor {
    pub fn new(doc: Document, selection: Selection, settings: EditorSettings) -> Self {
        let editor = Editor::with_config(
            doc,
            selection,
            PluginRegistry::journal(),
            settings.editor_config(),
        );
        Self {
            editor,
            settings,
            localizer: None,
        }
    }

    /// Opens a stored post body with the caret at its start.
    pub fn load(json: &str, settings: EditorSettings) -> Result<Self, DispatchError> {
        let value = DocumentValue::from_json_str(json)?;
        tracing::debug!(version = value.version, "open post body");
        let doc = value.into_document();
        let start = first_text_point(&doc).unwrap_or_else(|| Point::new(vec![0, 0], 0));
        Ok(Self::new(doc, Selection::collapsed(start), settings))
    }

    /// The post body in its stored form, at the current version.
    pub fn save(&self) -> Result<String, DispatchError> {
        let value = DocumentValue::from_document(self.doc().clone());
        Ok(value.to_json_pretty()?)
    }

    /// Translations from `localizer` take precedence over the settings catalog.
    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Some(Box::new(localizer));
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn into_editor(self) -> Editor {
        self.editor
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn doc(&self) -> &Document {
        self.editor.doc()
    }

    pub fn selection(&self) -> &Selection {
        self.editor.selection()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.editor.set_selection(selection);
    }

    pub fn message(&self, key: MessageKey) -> String {
        self.localizer
            .as_deref()
            .and_then(|l| l.translate(key))
            .or_else(|| self.settings.messages.translate(key))
            .unwrap_or_else(|| key.fallback().to_string())
    }

    pub fn is_active(&self, kind: CommandKind, format: &str) -> bool {
        match kind {
            CommandKind::Mark => self.is_mark_active(format),
            CommandKind::Block => self.is_block_active(format),
            CommandKind::Link => self.is_block_active(LINK),
            CommandKind::Table => self.is_block_active(TABLE),
            CommandKind::Image => self.is_block_active(IMAGE),
        }
    }

    pub fn is_mark_active(&self, format: &str) -> bool {
        self.editor.marks().contains(format)
    }

    pub fn is_block_active(&self, format: &str) -> bool {
        self.editor.some_element_of_kind(format)
    }

    pub async fn toggle(
        &mut self,
        command: &Command,
        host: &impl Host,
    ) -> Result<Outcome, DispatchError> {
        tracing::debug!(kind = %command.kind, format = %command.format, "dispatch command");
        match command.kind {
            CommandKind::Mark => self.toggle_mark(&command.format),
            CommandKind::Block => self.toggle_block(&command.format),
            CommandKind::Link => self.toggle_link(command.text.as_deref(), host).await,
            CommandKind::Table => self.handle_table(&command.format),
            CommandKind::Image => match host.pick_image().await {
                Some(file) => self.insert_image(file.as_ref()).await,
                None => Ok(Outcome::Cancelled),
            },
        }
    }

    pub fn toggle_mark(&mut self, format: &str) -> Result<Outcome, DispatchError> {
        let active = self.is_mark_active(format);
        self.editor.change("toggle-mark", |draft| {
            if active {
                draft.remove_mark(format)
            } else {
                draft.add_mark(format)
            }
        })?;
        Ok(Outcome::Applied)
    }

    /// Switches the selected blocks to `format`, or back to paragraphs when
    /// `format` is already active. List formats also add or drop the list
    /// container around the items.
    pub fn toggle_block(&mut self, format: &str) -> Result<Outcome, DispatchError> {
        let active = self.is_block_active(format);
        let is_list = is_list_type(format);

        self.editor.change("toggle-block", |draft| {
            draft.unwrap_elements(is_list_container, true)?;
            let kind = if active {
                PARAGRAPH
            } else if is_list {
                journaly_document::LIST_ITEM
            } else {
                format
            };
            draft.set_block_kind(kind)?;
            if !active && is_list {
                draft.wrap_blocks(Node::element(format, Vec::new()))?;
            }
            Ok(())
        })?;
        Ok(Outcome::Applied)
    }

    /// Removes an active link, otherwise asks for a URL and links the
    /// selection to it.
    pub async fn toggle_link(
        &mut self,
        answer: Option<&str>,
        host: &impl Host,
    ) -> Result<Outcome, DispatchError> {
        if self.is_block_active(LINK) {
            return self.unwrap_link();
        }

        let url = match answer {
            Some(answer) => Some(answer.to_string()),
            None => host.prompt_url(&self.message(MessageKey::EnterUrlPrompt)).await,
        };
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            return Ok(Outcome::Cancelled);
        };

        let url = with_protocol(&url);
        if !is_url(&url) {
            tracing::warn!(%url, "rejected link url");
            host.notify_error(&self.message(MessageKey::WebsitePatternError));
            return Ok(Outcome::InvalidUrl);
        }

        self.wrap_link(&url)
    }

    /// Links the selection to `url`. A caret gets a new link showing the URL
    /// itself; a range is wrapped and the caret lands after it.
    pub fn wrap_link(&mut self, url: &str) -> Result<Outcome, DispatchError> {
        self.editor
            .change("wrap-link", |draft| wrap_link_in(draft, url))?;
        Ok(Outcome::Applied)
    }

    pub fn unwrap_link(&mut self) -> Result<Outcome, DispatchError> {
        self.editor
            .change("unwrap-link", |draft| draft.unwrap_elements(|kind| kind == LINK, false))?;
        Ok(Outcome::Applied)
    }

    /// Runs a table action. Only `insert-table` is known, and it does
    /// nothing while the selection is already inside a table.
    pub fn handle_table(&mut self, action: &str) -> Result<Outcome, DispatchError> {
        if action != INSERT_TABLE {
            tracing::debug!(action, "unknown table action");
            return Ok(Outcome::Ignored);
        }
        if self.is_active(CommandKind::Table, action) {
            return Ok(Outcome::Ignored);
        }

        let table = self.settings.table.empty_table();
        self.editor
            .change("insert-table", |draft| draft.insert_nodes(table))?;
        Ok(Outcome::Applied)
    }

    /// Reads `file` into a data URL and inserts it as an image block.
    pub async fn insert_image(&mut self, file: &dyn FileHandle) -> Result<Outcome, DispatchError> {
        let url = read_data_url(file).await?;
        tracing::debug!(name = file.name(), mime = file.mime(), "insert image");
        self.editor
            .change("insert-image", |draft| draft.insert_nodes(Node::image(url)))?;
        Ok(Outcome::Applied)
    }

    /// Typed text. Text that is itself a URL becomes a link.
    pub fn insert_text(&mut self, text: &str) -> Result<Outcome, DispatchError> {
        if text.is_empty() {
            return Ok(Outcome::Ignored);
        }
        self.editor
            .change("insert-text", |draft| type_text(draft, text))?;
        Ok(Outcome::Applied)
    }

    /// Pasted or dropped data. Image files are inserted as images and other
    /// files are skipped; without files the plain text is typed line by line.
    pub async fn insert_data(&mut self, data: &DataTransfer) -> Result<Outcome, DispatchError> {
        if !data.files.is_empty() {
            let mut outcome = Outcome::Ignored;
            for file in &data.files {
                if is_image_mime(file.mime()) {
                    outcome = self.insert_image(file.as_ref()).await?;
                } else {
                    tracing::debug!(name = file.name(), mime = file.mime(), "skip non-image file");
                }
            }
            return Ok(outcome);
        }

        let Some(text) = data.text.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(Outcome::Ignored);
        };
        self.editor.change("insert-data", |draft| {
            for (ix, line) in split_lines(text).enumerate() {
                if ix > 0 {
                    draft.split_block()?;
                }
                type_text(draft, line)?;
            }
            Ok(())
        })?;
        Ok(Outcome::Applied)
    }
}

fn type_text(draft: &mut Draft<'_>, text: &str) -> Result<(), ApplyError> {
    if is_url(text) {
        tracing::debug!(url = text, "typed url becomes a link");
        wrap_link_in(draft, text)?;
        draft.exit_inline()
    } else {
        draft.insert_text(text)
    }
}

fn wrap_link_in(draft: &mut Draft<'_>, url: &str) -> Result<(), ApplyError> {
    let in_link = journaly_document::elements_in_range(draft.doc(), draft.selection())
        .iter()
        .any(|p| {
            draft
                .doc()
                .node_at(p)
                .and_then(|id| draft.doc().kind(id))
                == Some(LINK)
        });
    if in_link {
        draft.unwrap_elements(|kind| kind == LINK, false)?;
    }

    if draft.selection().is_collapsed() {
        draft.insert_nodes(Node::link(url, vec![Node::text(url)]))
    } else {
        draft.wrap_inline(Node::link(url, Vec::new()))?;
        draft.collapse(Edge::End);
        Ok(())
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}
