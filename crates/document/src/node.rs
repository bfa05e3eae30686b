use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Attrs = BTreeMap<String, Value>;
pub type ElementKind = String;

pub const PARAGRAPH: &str = "paragraph";
pub const LINK: &str = "link";
pub const IMAGE: &str = "image";

/// Owned node tree as it is stored and exchanged (Slate JSON shape).
///
/// The live document keeps nodes in an arena; `Node` is the value form used
/// for inserting fragments, reading them back and persisting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::element(PARAGRAPH, vec![Self::text(text)])
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("url".to_string(), Value::String(url.into()));
        Node::Element(ElementNode {
            kind: LINK.to_string(),
            attrs,
            children,
        })
    }

    pub fn image(url: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("url".to_string(), Value::String(url.into()));
        Node::Element(ElementNode {
            kind: IMAGE.to_string(),
            attrs,
            children: vec![Self::text("")],
        })
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.kind),
            Node::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    /// Concatenated text of every leaf below this node.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Element(el) => el.children.iter().map(Node::plain_text).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(flatten)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

/// Formatting flags that are switched on for a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct Marks(BTreeSet<String>);

impl Marks {
    pub fn contains(&self, format: &str) -> bool {
        self.0.contains(format)
    }

    pub fn insert(&mut self, format: impl Into<String>) -> bool {
        self.0.insert(format.into())
    }

    pub fn remove(&mut self, format: &str) -> bool {
        self.0.remove(format)
    }

    pub fn with(mut self, format: impl Into<String>) -> Self {
        self.insert(format);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<BTreeMap<String, bool>> for Marks {
    fn from(value: BTreeMap<String, bool>) -> Self {
        Marks(
            value
                .into_iter()
                .filter_map(|(k, on)| on.then_some(k))
                .collect(),
        )
    }
}

impl From<Marks> for BTreeMap<String, bool> {
    fn from(value: Marks) -> Self {
        value.0.into_iter().map(|k| (k, true)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Marks {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Marks(iter.into_iter().map(Into::into).collect())
    }
}
