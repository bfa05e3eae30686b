use std::collections::HashSet;

use crate::arena::{Document, NodeId};
use crate::core::{Editor, Point, Selection};
use crate::node::Marks;
use crate::ops::{Path, child_path};
use crate::plugin::PluginRegistry;

/// Paths of every text leaf, in document order.
pub fn leaf_paths(doc: &Document) -> Vec<Path> {
    fn walk(doc: &Document, id: NodeId, path: &mut Vec<usize>, out: &mut Vec<Path>) {
        for (ix, child) in doc.children(id).iter().enumerate() {
            path.push(ix);
            if doc.is_text(*child) {
                out.push(path.clone());
            } else {
                walk(doc, *child, path, out);
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(doc, doc.root(), &mut Vec::new(), &mut out);
    out
}

fn leaf_paths_below(doc: &Document, path: &[usize]) -> Vec<Path> {
    leaf_paths(doc)
        .into_iter()
        .filter(|p| p.starts_with(path))
        .collect()
}

pub fn first_text_point(doc: &Document) -> Option<Point> {
    leaf_paths(doc).into_iter().next().map(|p| Point::new(p, 0))
}

pub fn first_text_below(doc: &Document, path: &[usize]) -> Option<Point> {
    start_of(doc, path)
}

/// First point inside the subtree at `path`.
pub fn start_of(doc: &Document, path: &[usize]) -> Option<Point> {
    leaf_paths_below(doc, path)
        .into_iter()
        .next()
        .map(|p| Point::new(p, 0))
}

/// Last point inside the subtree at `path`.
pub fn end_of(doc: &Document, path: &[usize]) -> Option<Point> {
    let last = leaf_paths_below(doc, path).pop()?;
    let len = text_len(doc, &last);
    Some(Point::new(last, len))
}

pub fn text_len(doc: &Document, path: &[usize]) -> usize {
    doc.node_at(path)
        .and_then(|id| doc.text(id))
        .map(str::len)
        .unwrap_or(0)
}

/// Leaves between the selection edges, both edge leaves included.
pub fn leaves_in_range(doc: &Document, selection: &Selection) -> Vec<Path> {
    let (start, end) = selection.edges();
    leaf_paths(doc)
        .into_iter()
        .filter(|p| *p >= start.path && *p <= end.path)
        .collect()
}

/// Element paths touched by the selection: ancestors of every leaf in range,
/// in document order.
pub fn elements_in_range(doc: &Document, selection: &Selection) -> Vec<Path> {
    let mut seen: HashSet<Path> = HashSet::new();
    let mut out = Vec::new();
    for leaf in leaves_in_range(doc, selection) {
        for len in 1..leaf.len() {
            let prefix = leaf[..len].to_vec();
            if seen.insert(prefix.clone()) {
                out.push(prefix);
            }
        }
    }
    out
}

/// Nearest element at or above `path` accepted by `pred`.
pub fn above(
    doc: &Document,
    path: &[usize],
    pred: impl Fn(&Document, NodeId) -> bool,
) -> Option<Path> {
    for len in (1..=path.len()).rev() {
        let candidate = &path[..len];
        let Some(id) = doc.node_at(candidate) else {
            continue;
        };
        if doc.is_element(id) && pred(doc, id) {
            return Some(candidate.to_vec());
        }
    }
    None
}

pub fn ancestor_of_kind(doc: &Document, path: &[usize], kind: &str) -> Option<Path> {
    above(doc, path, |doc, id| doc.kind(id) == Some(kind))
}

/// A non-void block whose children are only text and inline elements.
pub fn is_text_block(doc: &Document, registry: &PluginRegistry, id: NodeId) -> bool {
    let Some(kind) = doc.kind(id) else {
        return false;
    };
    if registry.is_inline(kind) || registry.is_void(kind) {
        return false;
    }
    doc.children(id).iter().all(|child| match doc.kind(*child) {
        Some(kind) => registry.is_inline(kind),
        None => true,
    })
}

/// Lowest block that contains `path`.
pub fn lowest_block(doc: &Document, registry: &PluginRegistry, path: &[usize]) -> Option<Path> {
    above(doc, path, |doc, id| {
        doc.kind(id).is_some_and(|kind| !registry.is_inline(kind))
    })
}

/// Nearest void element at or above `path`.
pub fn void_above(doc: &Document, registry: &PluginRegistry, path: &[usize]) -> Option<Path> {
    above(doc, path, |doc, id| {
        doc.kind(id).is_some_and(|kind| registry.is_void(kind))
    })
}

pub fn text_blocks_in_range(
    doc: &Document,
    registry: &PluginRegistry,
    selection: &Selection,
) -> Vec<Path> {
    elements_in_range(doc, selection)
        .into_iter()
        .filter(|p| {
            doc.node_at(p)
                .is_some_and(|id| is_text_block(doc, registry, id))
        })
        .collect()
}

/// Whether nothing but empty text precedes `point` inside `block`.
pub fn is_block_start(doc: &Document, block: &[usize], point: &Point) -> bool {
    point.offset == 0
        && leaf_paths_below(doc, block)
            .iter()
            .take_while(|p| **p < point.path)
            .all(|p| text_len(doc, p) == 0)
}

/// Whether nothing but empty text follows `point` inside `block`.
pub fn is_block_end(doc: &Document, block: &[usize], point: &Point) -> bool {
    point.offset >= text_len(doc, &point.path)
        && leaf_paths_below(doc, block)
            .iter()
            .filter(|p| **p > point.path)
            .all(|p| text_len(doc, p) == 0)
}

/// Marks that typing at the selection would pick up.
///
/// A range reports the first leaf it covers. A caret at the very start of a
/// non-empty leaf continues the previous leaf of the same block.
pub fn active_marks(doc: &Document, registry: &PluginRegistry, selection: &Selection) -> Marks {
    let marks_at = |path: &[usize]| {
        doc.node_at(path)
            .and_then(|id| doc.marks(id))
            .cloned()
            .unwrap_or_default()
    };

    if !selection.is_collapsed() {
        let (start, _) = selection.edges();
        let leaves = leaves_in_range(doc, selection);
        let first = leaves
            .iter()
            .find(|p| **p != start.path || start.offset < text_len(doc, p))
            .or_else(|| leaves.first());
        return first.map(|p| marks_at(p)).unwrap_or_default();
    }

    let focus = &selection.focus;
    if focus.offset == 0 && text_len(doc, &focus.path) > 0 {
        if let Some(block) = lowest_block(doc, registry, &focus.path) {
            let prev = leaf_paths_below(doc, &block)
                .into_iter()
                .take_while(|p| *p < focus.path)
                .last();
            if let Some(prev) = prev {
                return marks_at(&prev);
            }
        }
    }
    marks_at(&focus.path)
}

pub fn children_paths(doc: &Document, parent: &[usize]) -> Vec<Path> {
    let Some(id) = doc.node_at(parent) else {
        return Vec::new();
    };
    (0..doc.children(id).len())
        .map(|ix| child_path(parent, ix))
        .collect()
}

impl Editor {
    /// Marks active at the current selection, pending marks first.
    pub fn marks(&self) -> Marks {
        match self.pending_marks() {
            Some(marks) => marks.clone(),
            None => active_marks(self.doc(), self.registry(), self.selection()),
        }
    }

    pub fn elements_in_selection(&self) -> Vec<Path> {
        elements_in_range(self.doc(), self.selection())
    }

    /// Whether any element touched by the selection has `kind`.
    pub fn some_element_of_kind(&self, kind: &str) -> bool {
        self.elements_in_selection()
            .iter()
            .any(|p| self.doc().node_at(p).and_then(|id| self.doc().kind(id)) == Some(kind))
    }
}
