use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    EnterUrlPrompt,
    WebsitePatternError,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::EnterUrlPrompt => "enterUrlPrompt",
            MessageKey::WebsitePatternError => "websitePatternError",
        }
    }

    /// English text used when no translation is available.
    pub fn fallback(&self) -> &'static str {
        match self {
            MessageKey::EnterUrlPrompt => "Enter the URL of the link:",
            MessageKey::WebsitePatternError => "Please enter a valid URL",
        }
    }
}

pub trait Localizer {
    fn translate(&self, key: MessageKey) -> Option<String>;
}

/// Translations keyed by message id, as loaded from the app's locale files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, String>);

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MessageKey, text: impl Into<String>) {
        self.0.insert(key.as_str().to_string(), text.into());
    }

    pub fn with(mut self, key: MessageKey, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Localizer for Catalog {
    fn translate(&self, key: MessageKey) -> Option<String> {
        self.0.get(key.as_str()).cloned()
    }
}

impl<F> Localizer for F
where
    F: Fn(MessageKey) -> Option<String>,
{
    fn translate(&self, key: MessageKey) -> Option<String> {
        self(key)
    }
}
