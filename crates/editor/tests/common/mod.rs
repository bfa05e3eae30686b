#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use journaly_document::{Document, Node, Point, Selection};
use journaly_editor::{EditorSettings, FileHandle, Host, InMemoryFile, JournalEditor};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Host double that answers prompts from a script and records what the
/// editor showed to the user.
#[derive(Default)]
pub struct ScriptedHost {
    answers: RefCell<VecDeque<Option<String>>>,
    images: RefCell<VecDeque<InMemoryFile>>,
    pub prompts: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
}

impl ScriptedHost {
    pub fn answering(answer: Option<&str>) -> Self {
        let host = Self::default();
        host.answers
            .borrow_mut()
            .push_back(answer.map(str::to_string));
        host
    }

    pub fn picking(file: InMemoryFile) -> Self {
        let host = Self::default();
        host.images.borrow_mut().push_back(file);
        host
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Host for ScriptedHost {
    fn prompt_url(&self, message: &str) -> LocalBoxFuture<'_, Option<String>> {
        self.prompts.borrow_mut().push(message.to_string());
        let answer = self.answers.borrow_mut().pop_front().flatten();
        futures::future::ready(answer).boxed_local()
    }

    fn pick_image(&self) -> LocalBoxFuture<'_, Option<Box<dyn FileHandle>>> {
        let file = self
            .images
            .borrow_mut()
            .pop_front()
            .map(|file| Box::new(file) as Box<dyn FileHandle>);
        futures::future::ready(file).boxed_local()
    }

    fn notify_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

pub fn caret(path: &[usize], offset: usize) -> Selection {
    Selection::collapsed(Point::new(path.to_vec(), offset))
}

pub fn range(path: &[usize], start: usize, end: usize) -> Selection {
    Selection::new(
        Point::new(path.to_vec(), start),
        Point::new(path.to_vec(), end),
    )
}

pub fn journal(children: Vec<Node>, selection: Selection) -> JournalEditor {
    init_tracing();
    JournalEditor::new(
        Document::new(children),
        selection,
        EditorSettings::default(),
    )
}
