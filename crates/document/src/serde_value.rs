//! Stored form of a journal post body.
//!
//! Bodies are saved inside a `{ schema, version, document }` envelope. Posts
//! written before the envelope existed are a bare array of top-level nodes
//! and load as version 0.

use serde::{Deserialize, Serialize};

use crate::arena::Document;
use crate::node::Node;

pub const SCHEMA: &str = "journaly";
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("malformed post body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("post body has schema {0:?}, expected {SCHEMA:?}")]
    UnknownSchema(String),
    #[error("post body version {found} is newer than supported version {CURRENT_VERSION}")]
    UnsupportedVersion { found: u32 },
}

fn default_schema() -> String {
    SCHEMA.to_string()
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Envelope(DocumentValue),
    Legacy(Vec<Node>),
}

impl DocumentValue {
    /// Wraps `document` for saving at the current version.
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: CURRENT_VERSION,
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn is_legacy(&self) -> bool {
        self.version == 0
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a stored body, accepting the legacy bare node array. Foreign
    /// schemas and versions newer than this build understands are rejected.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value = match serde_json::from_str(s)? {
            Stored::Envelope(value) => value,
            Stored::Legacy(nodes) => {
                tracing::debug!(nodes = nodes.len(), "legacy post body");
                Self {
                    schema: default_schema(),
                    version: 0,
                    document: Document::new(nodes),
                }
            }
        };

        if value.schema != SCHEMA {
            return Err(ValueError::UnknownSchema(value.schema));
        }
        if value.version > CURRENT_VERSION {
            return Err(ValueError::UnsupportedVersion {
                found: value.version,
            });
        }
        Ok(value)
    }
}
