//! Arena storage for the live document tree.
//!
//! Nodes live in a flat slot vector and refer to each other by [`NodeId`].
//! Parent links and ordered child lists are plain index lists, so the tree
//! can be walked in both directions without shared mutable references.
//! Freed slots are recycled by later inserts.

use serde::{Deserialize, Serialize};

use crate::node::{Attrs, ElementKind, ElementNode, Marks, Node, TextNode};
use crate::ops::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Root,
    Element { kind: ElementKind, attrs: Attrs },
    Text { text: String, marks: Marks },
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PathError(pub String);

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.to_nodes() == other.to_nodes()
    }
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        let mut doc = Self {
            slots: vec![Some(Slot {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            })],
            free: Vec::new(),
            root: NodeId(0),
        };
        for (ix, node) in children.into_iter().enumerate() {
            doc.plant(doc.root, ix, node);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn kind(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> Option<&Attrs> {
        match self.data(id)? {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn marks(&self, id: NodeId) -> Option<&Marks> {
        match self.data(id)? {
            NodeData::Text { marks, .. } => Some(marks),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text { .. }))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    /// Resolves a path from the root. The empty path is the root itself.
    pub fn node_at(&self, path: &[usize]) -> Option<NodeId> {
        let mut id = self.root;
        for &ix in path {
            id = *self.children(id).get(ix)?;
        }
        Some(id)
    }

    pub fn path_of(&self, id: NodeId) -> Path {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let ix = self
                .children(parent)
                .iter()
                .position(|c| *c == current)
                .unwrap_or(0);
            path.push(ix);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn fragment(&self, id: NodeId) -> Option<Node> {
        match self.data(id)? {
            NodeData::Root => None,
            NodeData::Text { text, marks } => Some(Node::Text(TextNode {
                text: text.clone(),
                marks: marks.clone(),
            })),
            NodeData::Element { kind, attrs } => Some(Node::Element(ElementNode {
                kind: kind.clone(),
                attrs: attrs.clone(),
                children: self
                    .children(id)
                    .iter()
                    .filter_map(|c| self.fragment(*c))
                    .collect(),
            })),
        }
    }

    pub fn fragment_at(&self, path: &[usize]) -> Option<Node> {
        if path.is_empty() {
            return None;
        }
        self.fragment(self.node_at(path)?)
    }

    /// Top-level nodes as owned fragments.
    pub fn to_nodes(&self) -> Vec<Node> {
        self.children(self.root)
            .iter()
            .filter_map(|c| self.fragment(*c))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn alloc(&mut self, slot: Slot) -> NodeId {
        if let Some(ix) = self.free.pop() {
            self.slots[ix] = Some(slot);
            NodeId(ix)
        } else {
            self.slots.push(Some(slot));
            NodeId(self.slots.len() - 1)
        }
    }

    fn plant(&mut self, parent: NodeId, index: usize, node: Node) -> NodeId {
        let (data, children) = match node {
            Node::Text(t) => (
                NodeData::Text {
                    text: t.text,
                    marks: t.marks,
                },
                Vec::new(),
            ),
            Node::Element(el) => (
                NodeData::Element {
                    kind: el.kind,
                    attrs: el.attrs,
                },
                el.children,
            ),
        };
        let id = self.alloc(Slot {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        for (ix, child) in children.into_iter().enumerate() {
            self.plant(id, ix, child);
        }
        if let Some(p) = self.slot_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        id
    }

    fn uproot(&mut self, id: NodeId) -> Option<Node> {
        let node = self.fragment(id)?;
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.slot_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.release(id);
        Some(node)
    }

    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        self.free.push(id.0);
        for child in slot.children {
            self.release(child);
        }
    }

    fn container_at(&self, path: &[usize]) -> Result<NodeId, PathError> {
        let id = self
            .node_at(path)
            .ok_or_else(|| PathError(format!("Path out of bounds: {path:?}")))?;
        if self.is_text(id) {
            return Err(PathError(format!("Non-container node at {path:?}")));
        }
        Ok(id)
    }

    pub(crate) fn insert_at(&mut self, path: &[usize], node: Node) -> Result<NodeId, PathError> {
        let Some((&index, parent_path)) = path.split_last() else {
            return Err(PathError("Empty insert path".into()));
        };
        let parent = self.container_at(parent_path)?;
        let len = self.children(parent).len();
        if index > len {
            return Err(PathError(format!(
                "Insert index out of bounds: {index} > {len}"
            )));
        }
        Ok(self.plant(parent, index, node))
    }

    pub(crate) fn remove_at(&mut self, path: &[usize]) -> Result<Node, PathError> {
        if path.is_empty() {
            return Err(PathError("Empty remove path".into()));
        }
        let id = self
            .node_at(path)
            .ok_or_else(|| PathError(format!("Remove path out of bounds: {path:?}")))?;
        self.uproot(id)
            .ok_or_else(|| PathError(format!("Failed to remove {path:?}")))
    }

    pub(crate) fn data_mut(&mut self, path: &[usize]) -> Result<&mut NodeData, PathError> {
        if path.is_empty() {
            return Err(PathError("Empty path".into()));
        }
        let id = self
            .node_at(path)
            .ok_or_else(|| PathError(format!("Path out of bounds: {path:?}")))?;
        self.slot_mut(id)
            .map(|s| &mut s.data)
            .ok_or_else(|| PathError("Failed to resolve path".into()))
    }
}

#[derive(Serialize, Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    children: Vec<Node>,
}

impl Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DocumentRepr {
            children: self.to_nodes(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DocumentRepr::deserialize(deserializer)?;
        Ok(Document::new(repr.children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_slots_are_reused() {
        let mut doc = Document::new(vec![Node::paragraph("a"), Node::paragraph("b")]);
        let before = doc.live_nodes();
        let removed = doc.remove_at(&[0]).unwrap();
        assert_eq!(removed, Node::paragraph("a"));
        assert_eq!(doc.live_nodes(), before - 2);

        doc.insert_at(&[1], Node::paragraph("c")).unwrap();
        assert_eq!(doc.live_nodes(), before);
        assert_eq!(doc.slots.len(), before);
        assert_eq!(
            doc.to_nodes(),
            vec![Node::paragraph("b"), Node::paragraph("c")]
        );
    }

    #[test]
    fn path_of_inverts_node_at() {
        let doc = Document::new(vec![
            Node::paragraph("a"),
            Node::element(
                "bulleted-list",
                vec![
                    Node::element("list-item", vec![Node::text("x")]),
                    Node::element("list-item", vec![Node::text("y")]),
                ],
            ),
        ]);
        let id = doc.node_at(&[1, 1, 0]).unwrap();
        assert_eq!(doc.text(id), Some("y"));
        assert_eq!(doc.path_of(id), vec![1, 1, 0]);
        assert_eq!(doc.node_at(&[]), Some(doc.root()));
        assert_eq!(doc.node_at(&[2]), None);
    }
}
