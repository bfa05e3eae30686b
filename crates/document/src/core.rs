use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::arena::{Document, NodeData, PathError};
use crate::node::{Attrs, Marks, Node};
use crate::ops::{Op, Path, Transaction, common_ancestor, next_path, previous_path};
use crate::plugin::{PluginRegistry, TransactionPreview};
use crate::query::{first_text_point, leaf_paths};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// Start and end in document order.
    pub fn edges(&self) -> (&Point, &Point) {
        if self.is_backward() {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    pub fn start(&self) -> &Point {
        self.edges().0
    }

    pub fn end(&self) -> &Point {
        self.edges().1
    }
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    marks: Option<Marks>,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: config.with_defaults(),
            marks: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_in_place();
        editor
    }

    pub fn with_core_plugins() -> Self {
        Self::empty(PluginRegistry::core())
    }

    pub fn with_journal_plugins() -> Self {
        Self::empty(PluginRegistry::journal())
    }

    fn empty(registry: PluginRegistry) -> Self {
        let doc = Document::new(vec![Node::paragraph("")]);
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        Self::new(doc, selection, registry)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.marks = None;
        self.normalize_selection_in_place();
    }

    /// Marks queued for the next typed text at a collapsed selection.
    pub fn pending_marks(&self) -> Option<&Marks> {
        self.marks.as_ref()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let redo_ops = self.replay(inverse_ops);
        self.marks = None;

        self.selection = selection_before.clone();
        self.normalize_in_place();

        self.redo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: redo_ops,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let undo_ops = self.replay(inverse_ops);
        self.marks = None;

        self.selection = selection_after.clone();
        self.normalize_in_place();

        self.undo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: undo_ops,
        });
        true
    }

    fn replay(&mut self, ops: Vec<Op>) -> Vec<Op> {
        let mut inverse: Vec<Op> = Vec::new();
        for op in ops {
            match apply_op_to(&mut self.doc, &mut self.selection, op) {
                Ok(inv) => inverse.push(inv),
                Err(err) => {
                    // Stop mutating once the history no longer lines up.
                    tracing::warn!("history replay stopped: {err}");
                    break;
                }
            }
        }
        inverse.reverse();
        inverse
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let source = tx.meta.source.clone().unwrap_or_else(|| "apply".to_string());
        self.change(&source, |draft| {
            for op in tx.ops {
                draft.apply(op)?;
            }
            if let Some(sel) = tx.selection_after {
                draft.set_selection(sel);
            }
            Ok(())
        })
    }

    /// Runs `f` against a draft that applies ops immediately, then normalizes
    /// once and records a single undo step. An error rolls every applied op
    /// back and leaves the editor as it was.
    pub fn change<T>(
        &mut self,
        source: &str,
        f: impl FnOnce(&mut Draft<'_>) -> Result<T, ApplyError>,
    ) -> Result<T, ApplyError> {
        let selection_before = self.selection.clone();
        let marks_before = self.marks.clone();

        let (result, mut inverse_ops) = {
            let mut draft = Draft {
                doc: &mut self.doc,
                selection: &mut self.selection,
                marks: &mut self.marks,
                registry: &self.registry,
                inverse_ops: Vec::new(),
            };
            let result = f(&mut draft);
            (result, draft.inverse_ops)
        };

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                self.rollback(inverse_ops, selection_before);
                self.marks = marks_before;
                return Err(err);
            }
        };

        match self.normalize_with_inverse_ops() {
            Ok(mut normalize_inverse) => inverse_ops.append(&mut normalize_inverse),
            Err(err) => {
                self.rollback(inverse_ops, selection_before);
                self.marks = marks_before;
                return Err(err);
            }
        }

        self.normalize_selection_in_place();
        if inverse_ops.is_empty() {
            return Ok(value);
        }
        inverse_ops.reverse();

        tracing::trace!(source, ops = inverse_ops.len(), "change recorded");

        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after: self.selection.clone(),
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(value)
    }

    fn rollback(&mut self, mut applied_inverse: Vec<Op>, selection_before: Selection) {
        applied_inverse.reverse();
        let _ = self.replay(applied_inverse);
        self.selection = selection_before;
        self.normalize_selection_in_place();
    }

    pub fn preview_transaction(&self, tx: &Transaction) -> Result<TransactionPreview, ApplyError> {
        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();

        for op in tx.ops.iter().cloned() {
            let _ = apply_op_to(&mut doc, &mut selection, op)?;
        }

        if let Some(sel) = &tx.selection_after {
            selection = sel.clone();
        }

        let mut converged = false;
        for _ in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&doc);
            if ops.is_empty() {
                converged = true;
                break;
            }
            for op in ops {
                let _ = apply_op_to(&mut doc, &mut selection, op)?;
            }
        }

        if !converged {
            return Err(ApplyError::NormalizeDidNotConverge);
        }

        selection = normalize_selection(&doc, &selection);

        Ok(TransactionPreview { doc, selection })
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize_with_inverse_ops() {
            tracing::warn!("document normalization failed: {err}");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_selection_in_place(&mut self) {
        self.selection = normalize_selection(&self.doc, &self.selection);
    }

    fn normalize_with_inverse_ops(&mut self) -> Result<Vec<Op>, ApplyError> {
        let mut inverse_ops: Vec<Op> = Vec::new();
        for round in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&self.doc);
            if ops.is_empty() {
                return Ok(inverse_ops);
            }
            tracing::trace!(round, ops = ops.len(), "normalize");
            for op in ops {
                let inv = apply_op_to(&mut self.doc, &mut self.selection, op)?;
                inverse_ops.push(inv);
            }
        }
        Err(ApplyError::NormalizeDidNotConverge)
    }
}

/// Mutable view handed to [`Editor::change`]. Ops are applied as they are
/// issued so later steps can query the intermediate tree.
pub struct Draft<'a> {
    doc: &'a mut Document,
    selection: &'a mut Selection,
    marks: &'a mut Option<Marks>,
    registry: &'a PluginRegistry,
    inverse_ops: Vec<Op>,
}

impl Draft<'_> {
    pub fn doc(&self) -> &Document {
        self.doc
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    pub fn registry(&self) -> &PluginRegistry {
        self.registry
    }

    pub fn set_selection(&mut self, selection: Selection) {
        *self.selection = selection;
        *self.marks = None;
    }

    pub fn pending_marks(&self) -> Option<&Marks> {
        self.marks.as_ref()
    }

    pub fn set_pending_marks(&mut self, marks: Option<Marks>) {
        *self.marks = marks;
    }

    pub fn apply(&mut self, op: Op) -> Result<(), ApplyError> {
        let inv = apply_op_to(self.doc, self.selection, op)?;
        self.inverse_ops.push(inv);
        Ok(())
    }

    pub fn ops_applied(&self) -> usize {
        self.inverse_ops.len()
    }
}

fn apply_op_to(doc: &mut Document, selection: &mut Selection, op: Op) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let (node_text, _) = text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(node_text, offset);
            node_text.insert_str(offset, &text);
            transform_selection_insert_text(selection, &path, offset, text.len());
            Ok(Op::RemoveText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Op::RemoveText { path, range } => {
            let (node_text, _) = text_mut(doc, &path)?;
            let start = clamp_to_char_boundary(node_text, range.start.min(node_text.len()));
            let end = clamp_to_char_boundary(node_text, range.end.min(node_text.len()));
            if start >= end {
                return Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = node_text[start..end].to_string();
            node_text.replace_range(start..end, "");
            transform_selection_remove_text(selection, &path, start..end);
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            doc.insert_at(&path, node)?;
            for point in [&mut selection.anchor, &mut selection.focus] {
                shift_for_insert(point, &path);
            }
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let removed = doc.remove_at(&path)?;
            transform_selection_remove_node(selection, &path, doc);
            Ok(Op::InsertNode {
                path,
                node: removed,
            })
        }
        Op::MoveNode { from, to } => {
            if to.starts_with(&from) {
                return Err(ApplyError::InvalidOp(format!(
                    "Cannot move {from:?} into itself ({to:?})"
                )));
            }
            let node = doc.remove_at(&from)?;
            if let Err(err) = doc.insert_at(&to, node.clone()) {
                doc.insert_at(&from, node)?;
                return Err(err.into());
            }
            for point in [&mut selection.anchor, &mut selection.focus] {
                if point.path.starts_with(&from) {
                    let mut moved = to.clone();
                    moved.extend_from_slice(&point.path[from.len()..]);
                    point.path = moved;
                } else {
                    shift_for_remove(point, &from);
                    shift_for_insert(point, &to);
                }
            }
            Ok(Op::MoveNode { from: to, to: from })
        }
        Op::SplitText { path, offset } => {
            let (node_text, marks) = text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(node_text, offset);
            let tail = node_text.split_off(offset);
            let marks = marks.clone();
            let tail_path = next_path(&path);
            doc.insert_at(&tail_path, Node::marked(tail, marks))?;

            let forward = point_affinities(selection);
            for (point, forward) in [&mut selection.anchor, &mut selection.focus]
                .into_iter()
                .zip(forward)
            {
                if point.path == path {
                    if point.offset > offset || (point.offset == offset && forward) {
                        point.path = tail_path.clone();
                        point.offset -= offset;
                    }
                } else {
                    shift_for_insert(point, &tail_path);
                }
            }
            Ok(Op::MergeText { path: tail_path })
        }
        Op::MergeText { path } => {
            let prev = previous_path(&path)
                .ok_or_else(|| ApplyError::InvalidOp(format!("No leaf before {path:?}")))?;
            let (prev_len, prev_marks) = match doc.node_at(&prev).and_then(|id| doc.data(id)) {
                Some(NodeData::Text { text, marks }) => (text.len(), marks.clone()),
                _ => return Err(ApplyError::InvalidOp(format!("{prev:?} is not a text leaf"))),
            };
            match doc.node_at(&path).and_then(|id| doc.data(id)) {
                Some(NodeData::Text { marks, .. }) if *marks == prev_marks => {}
                Some(NodeData::Text { .. }) => {
                    return Err(ApplyError::InvalidOp(format!(
                        "Cannot merge {path:?}: marks differ"
                    )));
                }
                _ => return Err(ApplyError::InvalidOp(format!("{path:?} is not a text leaf"))),
            }
            let removed = doc.remove_at(&path)?;
            let tail = removed.plain_text();
            let (prev_text, _) = text_mut(doc, &prev)?;
            prev_text.push_str(&tail);

            for point in [&mut selection.anchor, &mut selection.focus] {
                if point.path == path {
                    point.path = prev.clone();
                    point.offset += prev_len;
                } else {
                    shift_for_remove(point, &path);
                }
            }
            Ok(Op::SplitText {
                path: prev,
                offset: prev_len,
            })
        }
        Op::SetNodeAttrs { path, patch } => match doc.data_mut(&path)? {
            NodeData::Element { attrs, .. } => {
                let old = patch_apply(attrs, &patch);
                Ok(Op::SetNodeAttrs { path, patch: old })
            }
            _ => Err(ApplyError::InvalidPath("Text has no attrs".into())),
        },
        Op::SetNodeKind { path, kind } => match doc.data_mut(&path)? {
            NodeData::Element { kind: current, .. } => {
                let old = std::mem::replace(current, kind);
                Ok(Op::SetNodeKind { path, kind: old })
            }
            _ => Err(ApplyError::InvalidPath("Only elements have a kind".into())),
        },
        Op::SetTextMarks { path, marks } => {
            let (_, current) = text_mut(doc, &path)?;
            let old = std::mem::replace(current, marks);
            Ok(Op::SetTextMarks { path, marks: old })
        }
    }
}

fn text_mut<'a>(
    doc: &'a mut Document,
    path: &[usize],
) -> Result<(&'a mut String, &'a mut Marks), PathError> {
    match doc.data_mut(path)? {
        NodeData::Text { text, marks } => Ok((text, marks)),
        _ => Err(PathError("Expected Text node".into())),
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// Collapsed points lean forward. For a range, the start leans forward and
/// the end backward so that splits at the edges keep the range tight.
fn point_affinities(selection: &Selection) -> [bool; 2] {
    if selection.is_collapsed() {
        return [true, true];
    }
    if selection.is_backward() {
        [false, true]
    } else {
        [true, false]
    }
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Selection,
    path: &[usize],
    range: std::ops::Range<usize>,
) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path {
            continue;
        }
        if point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn shift_for_insert(point: &mut Point, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };
    let depth = parent_path.len();
    if point.path.len() > depth
        && point.path.starts_with(parent_path)
        && point.path[depth] >= index
    {
        point.path[depth] += 1;
    }
}

/// Returns `false` when the point sat inside the removed subtree.
fn shift_for_remove(point: &mut Point, path: &[usize]) -> bool {
    let Some((&index, parent_path)) = path.split_last() else {
        return true;
    };
    let depth = parent_path.len();
    if point.path.len() <= depth || !point.path.starts_with(parent_path) {
        return true;
    }
    match point.path[depth].cmp(&index) {
        Ordering::Greater => {
            point.path[depth] -= 1;
            true
        }
        Ordering::Less => true,
        Ordering::Equal => false,
    }
}

fn transform_selection_remove_node(
    selection: &mut Selection,
    path: &[usize],
    doc_after_remove: &Document,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if shift_for_remove(point, path) {
            continue;
        }

        // Point was inside the removed subtree: end of the previous leaf or
        // start of the next one, whichever shares more ancestry with `path`.
        let leaves = leaf_paths(doc_after_remove);
        let next_ix = leaves.partition_point(|p| p.as_slice() < path);
        let prev = next_ix.checked_sub(1).map(|ix| &leaves[ix]);
        let next = leaves.get(next_ix);

        let prefer_next = match (prev, next) {
            (Some(_), Some(next)) if next.as_slice() == path => {
                next.last().is_some_and(|ix| *ix == 0)
            }
            (Some(prev), Some(next)) => {
                common_ancestor(prev, path).len() < common_ancestor(next, path).len()
            }
            _ => false,
        };

        match (prev, next) {
            (Some(prev), _) if !prefer_next => {
                let len = doc_after_remove
                    .node_at(prev)
                    .and_then(|id| doc_after_remove.text(id))
                    .map(str::len)
                    .unwrap_or(0);
                *point = Point::new(prev.clone(), len);
            }
            (_, Some(next)) => *point = Point::new(next.clone(), 0),
            _ => {}
        }
    }
}

/// Snaps both points onto existing text leaves.
pub fn normalize_selection(doc: &Document, selection: &Selection) -> Selection {
    let fallback = first_text_point(doc).unwrap_or(Point {
        path: vec![0],
        offset: 0,
    });

    let anchor = normalize_point_to_existing_text(doc, &selection.anchor).unwrap_or_else(|| {
        normalize_point_to_existing_text(doc, &selection.focus).unwrap_or_else(|| fallback.clone())
    });
    let focus =
        normalize_point_to_existing_text(doc, &selection.focus).unwrap_or_else(|| anchor.clone());

    Selection { anchor, focus }
}

fn normalize_point_to_existing_text(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() || doc.is_empty() {
        return None;
    }

    let mut resolved_path: Vec<usize> = Vec::new();
    let mut current = doc.root();

    for &wanted in &point.path {
        let children = doc.children(current);
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        resolved_path.push(ix);
        current = children[ix];
        if let Some(text) = doc.text(current) {
            return Some(Point {
                path: resolved_path,
                offset: clamp_to_char_boundary(text, point.offset),
            });
        }
    }

    if let Some(text) = doc.text(current) {
        return Some(Point {
            path: resolved_path,
            offset: clamp_to_char_boundary(text, point.offset),
        });
    }
    crate::query::first_text_below(doc, &resolved_path)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) -> AttrPatch {
    let mut old_set: Attrs = Attrs::new();
    let mut old_remove: Vec<String> = Vec::new();

    for (k, v) in &patch.set {
        if let Some(prev) = attrs.insert(k.clone(), v.clone()) {
            old_set.insert(k.clone(), prev);
        } else {
            old_remove.push(k.clone());
        }
    }

    for key in &patch.remove {
        if let Some(prev) = attrs.remove(key) {
            old_set.insert(key.clone(), prev);
        }
    }

    AttrPatch {
        set: old_set,
        remove: old_remove,
    }
}
