use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// List container kinds a block toggle wraps list items in.
pub const LIST_TYPES: [&str; 2] = ["numbered-list", "bulleted-list"];

/// The only table action the toolbar exposes.
pub const INSERT_TABLE: &str = "insert-table";

pub fn is_list_type(format: &str) -> bool {
    LIST_TYPES.contains(&format)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Mark,
    Block,
    Link,
    Table,
    Image,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Mark => "mark",
            CommandKind::Block => "block",
            CommandKind::Link => "link",
            CommandKind::Table => "table",
            CommandKind::Image => "image",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark" => Ok(CommandKind::Mark),
            "block" => Ok(CommandKind::Block),
            "link" => Ok(CommandKind::Link),
            "table" => Ok(CommandKind::Table),
            "image" => Ok(CommandKind::Image),
            other => Err(DispatchError::UnknownCommandKind(other.to_string())),
        }
    }
}

/// One user intent, built per toolbar click or shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    #[serde(default)]
    pub format: String,
    /// Answer supplied up front instead of prompting, e.g. a link URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind, format: impl Into<String>) -> Self {
        Self {
            kind,
            format: format.into(),
            text: None,
        }
    }

    pub fn mark(format: impl Into<String>) -> Self {
        Self::new(CommandKind::Mark, format)
    }

    pub fn block(format: impl Into<String>) -> Self {
        Self::new(CommandKind::Block, format)
    }

    pub fn link() -> Self {
        Self::new(CommandKind::Link, "link")
    }

    pub fn table(action: impl Into<String>) -> Self {
        Self::new(CommandKind::Table, action)
    }

    pub fn image() -> Self {
        Self::new(CommandKind::Image, "image")
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}
