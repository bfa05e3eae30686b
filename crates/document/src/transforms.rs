//! Editing primitives available inside [`Editor::change`](crate::Editor::change).
//!
//! Each primitive issues plain [`Op`]s through the draft, so the selection
//! follows every step and the whole change undoes as one unit.

use crate::arena::{Document, NodeId};
use crate::core::{ApplyError, Draft, Point, Selection};
use crate::node::{ElementNode, Marks, Node};
use crate::ops::{Op, Path, child_path, common_ancestor, is_ancestor, next_path};
use crate::query::{
    above, active_marks, elements_in_range, end_of, is_block_end, is_block_start, leaf_paths,
    lowest_block, start_of, text_blocks_in_range, text_len, void_above,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

impl Draft<'_> {
    fn leaf_marks(&self, path: &[usize]) -> Marks {
        self.doc()
            .node_at(path)
            .and_then(|id| self.doc().marks(id))
            .cloned()
            .unwrap_or_default()
    }

    fn require(&self, path: &[usize]) -> Result<NodeId, ApplyError> {
        self.doc()
            .node_at(path)
            .ok_or_else(|| ApplyError::InvalidPath(format!("No node at {path:?}")))
    }

    /// Puts the caret at the start of whatever follows the node at `path`,
    /// adding an empty paragraph when nothing editable does.
    fn select_after(&mut self, path: &[usize]) -> Result<(), ApplyError> {
        let after = next_path(path);
        let landing = start_of(self.doc(), &after)
            .filter(|point| void_above(self.doc(), self.registry(), &point.path).is_none());
        let point = match landing {
            Some(point) => point,
            None => {
                self.apply(Op::InsertNode {
                    path: after.clone(),
                    node: Node::paragraph(""),
                })?;
                Point::new(child_path(&after, 0), 0)
            }
        };
        self.set_selection(Selection::collapsed(point));
        Ok(())
    }

    /// Moves a caret resting inside a void out to the block after it.
    fn leave_void(&mut self) -> Result<(), ApplyError> {
        let focus = self.selection().focus.clone();
        match void_above(self.doc(), self.registry(), &focus.path) {
            Some(void) => {
                tracing::trace!(?void, "caret leaves void");
                self.select_after(&void)
            }
            None => Ok(()),
        }
    }

    /// Moves the caret out of the inline element it sits in, onto the start
    /// of the text that follows it.
    pub fn exit_inline(&mut self) -> Result<(), ApplyError> {
        let focus = self.selection().focus.clone();
        let registry = self.registry();
        let Some(inline) = above(self.doc(), &focus.path, |doc, id| {
            doc.kind(id).is_some_and(|kind| registry.is_inline(kind))
        }) else {
            return Ok(());
        };

        let after = next_path(&inline);
        let next_is_text = self
            .doc()
            .node_at(&after)
            .is_some_and(|id| self.doc().is_text(id));
        if !next_is_text {
            self.apply(Op::InsertNode {
                path: after.clone(),
                node: Node::text(""),
            })?;
        }
        self.set_selection(Selection::collapsed(Point::new(after, 0)));
        Ok(())
    }

    pub fn collapse(&mut self, edge: Edge) {
        let point = match edge {
            Edge::Start => self.selection().start().clone(),
            Edge::End => self.selection().end().clone(),
        };
        self.set_selection(Selection::collapsed(point));
    }

    /// Types `text` at the caret, replacing an expanded selection first.
    /// Pending marks start a new leaf and are consumed.
    pub fn insert_text(&mut self, text: &str) -> Result<(), ApplyError> {
        if !self.selection().is_collapsed() {
            self.delete_selection()?;
        }
        if text.is_empty() {
            return Ok(());
        }
        self.leave_void()?;

        let point = self.selection().focus.clone();
        let pending = self.pending_marks().cloned();
        match pending {
            Some(marks) if marks != self.leaf_marks(&point.path) => {
                self.apply(Op::SplitText {
                    path: point.path.clone(),
                    offset: point.offset,
                })?;
                let leaf = next_path(&point.path);
                self.apply(Op::InsertNode {
                    path: leaf.clone(),
                    node: Node::marked(text, marks),
                })?;
                self.set_selection(Selection::collapsed(Point::new(leaf, text.len())));
            }
            _ => {
                self.apply(Op::InsertText {
                    path: point.path,
                    offset: point.offset,
                    text: text.to_string(),
                })?;
                self.set_pending_marks(None);
            }
        }
        Ok(())
    }

    /// Removes the selected content and collapses to its start. Text blocks
    /// cut in two by the range are joined.
    pub fn delete_selection(&mut self) -> Result<(), ApplyError> {
        if self.selection().is_collapsed() {
            return Ok(());
        }
        let (start, end) = {
            let (s, e) = self.selection().edges();
            (s.clone(), e.clone())
        };

        if start.path == end.path {
            self.apply(Op::RemoveText {
                path: start.path.clone(),
                range: start.offset..end.offset,
            })?;
            self.collapse(Edge::Start);
            return Ok(());
        }

        self.apply(Op::RemoveText {
            path: end.path.clone(),
            range: 0..end.offset,
        })?;
        let start_len = text_len(self.doc(), &start.path);
        self.apply(Op::RemoveText {
            path: start.path.clone(),
            range: start.offset..start_len,
        })?;

        for path in covered_subtrees(self.doc(), &start.path, &end.path)
            .into_iter()
            .rev()
        {
            self.apply(Op::RemoveNode { path })?;
        }

        let (start, end) = {
            let (s, e) = self.selection().edges();
            (s.clone(), e.clone())
        };
        let registry = self.registry();
        let start_block = lowest_block(self.doc(), registry, &start.path);
        let end_block = lowest_block(self.doc(), registry, &end.path);
        if let (Some(start_block), Some(end_block)) = (start_block, end_block) {
            let joinable = start_block != end_block
                && [&start_block, &end_block].iter().all(|p| {
                    self.doc()
                        .node_at(p)
                        .and_then(|id| self.doc().kind(id))
                        .is_some_and(|kind| !registry.is_void(kind))
                });
            if joinable {
                self.join_blocks(&start_block, &end_block)?;
            }
        }

        self.collapse(Edge::Start);
        Ok(())
    }

    /// Moves every child of `from` to the end of `into`, then drops `from`
    /// and any ancestors it leaves empty.
    fn join_blocks(&mut self, into: &[usize], from: &[usize]) -> Result<(), ApplyError> {
        let into_len = self.doc().children(self.require(into)?).len();
        let moved = self.doc().children(self.require(from)?).len();
        for k in 0..moved {
            self.apply(Op::MoveNode {
                from: child_path(from, 0),
                to: child_path(into, into_len + k),
            })?;
        }

        let mut target = from.to_vec();
        loop {
            self.apply(Op::RemoveNode {
                path: target.clone(),
            })?;
            let Some((_, parent)) = target.split_last() else {
                break;
            };
            if parent.is_empty() || is_ancestor(parent, into) {
                break;
            }
            let parent_id = self.require(parent)?;
            if !self.doc().children(parent_id).is_empty() {
                break;
            }
            target = parent.to_vec();
        }
        Ok(())
    }

    /// Splits the element at `path` so children from `at` onwards move into
    /// a new sibling of the same kind. Returns the sibling's path.
    pub fn split_node(&mut self, path: &[usize], at: usize) -> Result<Path, ApplyError> {
        let id = self.require(path)?;
        let (Some(kind), Some(attrs)) = (self.doc().kind(id), self.doc().attrs(id)) else {
            return Err(ApplyError::InvalidOp(format!("{path:?} is not an element")));
        };
        let sibling = Node::Element(ElementNode {
            kind: kind.to_string(),
            attrs: attrs.clone(),
            children: Vec::new(),
        });
        let len = self.doc().children(id).len();

        let sibling_path = next_path(path);
        self.apply(Op::InsertNode {
            path: sibling_path.clone(),
            node: sibling,
        })?;
        for k in 0..len.saturating_sub(at) {
            self.apply(Op::MoveNode {
                from: child_path(path, at),
                to: child_path(&sibling_path, k),
            })?;
        }
        Ok(sibling_path)
    }

    /// Splits the leaf at `point` and every element up to and including
    /// `block`. Returns the path of the block's second half.
    fn split_up_to(&mut self, point: &Point, block: &[usize]) -> Result<Path, ApplyError> {
        self.apply(Op::SplitText {
            path: point.path.clone(),
            offset: point.offset,
        })?;
        let mut right = next_path(&point.path);
        while let Some((&ix, parent)) = right.split_last() {
            if parent.len() < block.len() {
                break;
            }
            let parent = parent.to_vec();
            right = self.split_node(&parent, ix)?;
        }
        Ok(right)
    }

    /// Breaks the current text block at the caret.
    pub fn split_block(&mut self) -> Result<(), ApplyError> {
        if !self.selection().is_collapsed() {
            self.delete_selection()?;
        }
        let point = self.selection().focus.clone();
        let Some(block) = lowest_block(self.doc(), self.registry(), &point.path) else {
            return Ok(());
        };
        let is_void = self
            .doc()
            .node_at(&block)
            .and_then(|id| self.doc().kind(id))
            .is_some_and(|kind| self.registry().is_void(kind));

        if is_void {
            let after = next_path(&block);
            self.apply(Op::InsertNode {
                path: after.clone(),
                node: Node::paragraph(""),
            })?;
            self.set_selection(Selection::collapsed(Point::new(child_path(&after, 0), 0)));
            return Ok(());
        }

        self.split_up_to(&point, &block)?;
        Ok(())
    }

    /// Inserts `node` at the selection and selects its end.
    ///
    /// Inline nodes and text go between the halves of the caret leaf. Blocks
    /// go before the caret block when the caret is at its start, after it at
    /// its end, and between its halves otherwise. A void block is never
    /// selected; the caret moves to the start of what follows it.
    pub fn insert_nodes(&mut self, node: Node) -> Result<(), ApplyError> {
        if !self.selection().is_collapsed() {
            self.delete_selection()?;
        }
        let inline = match node.kind() {
            Some(kind) => self.registry().is_inline(kind),
            None => true,
        };
        let void_block = !inline && node.kind().is_some_and(|kind| self.registry().is_void(kind));
        if inline {
            self.leave_void()?;
        }
        let point = self.selection().focus.clone();

        let at = if inline {
            self.apply(Op::SplitText {
                path: point.path.clone(),
                offset: point.offset,
            })?;
            next_path(&point.path)
        } else {
            match lowest_block(self.doc(), self.registry(), &point.path) {
                Some(block) if is_block_end(self.doc(), &block, &point) => next_path(&block),
                Some(block) if is_block_start(self.doc(), &block, &point) => block,
                Some(block) => self.split_up_to(&point, &block)?,
                None => vec![self.doc().children(self.doc().root()).len()],
            }
        };

        self.apply(Op::InsertNode {
            path: at.clone(),
            node,
        })?;
        if void_block {
            return self.select_after(&at);
        }
        if let Some(end) = end_of(self.doc(), &at) {
            self.set_selection(Selection::collapsed(end));
        }
        Ok(())
    }

    /// Sets the kind of every lowest block touched by the selection.
    pub fn set_block_kind(&mut self, kind: &str) -> Result<(), ApplyError> {
        let blocks = text_blocks_in_range(self.doc(), self.registry(), self.selection());
        for path in blocks {
            let id = self.require(&path)?;
            if self.doc().kind(id) == Some(kind) {
                continue;
            }
            self.apply(Op::SetNodeKind {
                path,
                kind: kind.to_string(),
            })?;
        }
        Ok(())
    }

    /// Lifts the children of matching elements in the selection into their
    /// parent. With `split`, only the children inside the range are lifted
    /// and the rest stay wrapped.
    pub fn unwrap_elements(
        &mut self,
        matches: impl Fn(&str) -> bool,
        split: bool,
    ) -> Result<(), ApplyError> {
        let targets: Vec<Path> = elements_in_range(self.doc(), self.selection())
            .into_iter()
            .filter(|p| {
                self.doc()
                    .node_at(p)
                    .and_then(|id| self.doc().kind(id))
                    .is_some_and(&matches)
            })
            .collect();

        for path in targets.into_iter().rev() {
            let len = self.doc().children(self.require(&path)?).len();
            let (mut first, mut last) = (0, len.saturating_sub(1));
            if split {
                let (start, end) = self.selection().edges();
                if start.path.starts_with(&path) && start.path.len() > path.len() {
                    first = start.path[path.len()];
                }
                if end.path.starts_with(&path) && end.path.len() > path.len() {
                    last = end.path[path.len()];
                }
            }

            if last + 1 < len {
                self.split_node(&path, last + 1)?;
            }
            let target = if first > 0 {
                self.split_node(&path, first)?
            } else {
                path
            };
            self.lift_children(&target)?;
        }
        Ok(())
    }

    /// Replaces the element at `path` with its children.
    fn lift_children(&mut self, path: &[usize]) -> Result<(), ApplyError> {
        let Some((&ix, parent)) = path.split_last() else {
            return Err(ApplyError::InvalidOp("Cannot unwrap the root".into()));
        };
        let count = self.doc().children(self.require(path)?).len();
        for k in 0..count {
            self.apply(Op::MoveNode {
                from: child_path(&child_path(parent, ix + k), 0),
                to: child_path(parent, ix + k),
            })?;
        }
        self.apply(Op::RemoveNode {
            path: child_path(parent, ix + count),
        })
    }

    /// Wraps the selected blocks, grouped under their common parent, in
    /// `wrapper`.
    pub fn wrap_blocks(&mut self, wrapper: Node) -> Result<(), ApplyError> {
        let blocks = text_blocks_in_range(self.doc(), self.registry(), self.selection());
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            return Ok(());
        };
        let mut parent = common_ancestor(first, last);
        if parent == *first || parent == *last {
            parent.pop();
        }
        let depth = parent.len();
        let (lo, hi) = (first[depth], last[depth]);
        self.wrap_children(&parent, lo, hi, wrapper)
    }

    fn wrap_children(
        &mut self,
        parent: &[usize],
        lo: usize,
        hi: usize,
        wrapper: Node,
    ) -> Result<(), ApplyError> {
        let wrapper_path = child_path(parent, lo);
        self.apply(Op::InsertNode {
            path: wrapper_path.clone(),
            node: wrapper,
        })?;
        for k in 0..=(hi - lo) {
            self.apply(Op::MoveNode {
                from: child_path(parent, lo + 1),
                to: child_path(&wrapper_path, k),
            })?;
        }
        Ok(())
    }

    /// Splits the leaves at the range edges and returns the leaves that lie
    /// fully inside the range.
    fn split_range_leaves(&mut self) -> Result<Vec<Path>, ApplyError> {
        let end = self.selection().end().clone();
        if end.offset > 0 && end.offset < text_len(self.doc(), &end.path) {
            self.apply(Op::SplitText {
                path: end.path,
                offset: end.offset,
            })?;
        }
        let start = self.selection().start().clone();
        if start.offset > 0 && start.offset < text_len(self.doc(), &start.path) {
            self.apply(Op::SplitText {
                path: start.path,
                offset: start.offset,
            })?;
        }

        let (start, end) = {
            let (s, e) = self.selection().edges();
            (s.clone(), e.clone())
        };
        let doc = self.doc();
        Ok(leaf_paths(doc)
            .into_iter()
            .filter(|p| *p >= start.path && *p <= end.path)
            .filter(|p| {
                let skip_start =
                    *p == start.path && p != &end.path && start.offset >= text_len(doc, p);
                let skip_end = *p == end.path && p != &start.path && end.offset == 0;
                !skip_start && !skip_end
            })
            .collect())
    }

    /// Wraps the selected inline content of each text block in `wrapper`,
    /// splitting leaves at the range edges.
    pub fn wrap_inline(&mut self, wrapper: Node) -> Result<(), ApplyError> {
        if self.selection().is_collapsed() {
            return Ok(());
        }
        let leaves = self.split_range_leaves()?;

        // Child index ranges per text block, in document order.
        let mut groups: Vec<(Path, usize, usize)> = Vec::new();
        for leaf in &leaves {
            if void_above(self.doc(), self.registry(), leaf).is_some() {
                continue;
            }
            let Some(block) = lowest_block(self.doc(), self.registry(), leaf) else {
                continue;
            };
            let ix = leaf[block.len()];
            match groups.last_mut() {
                Some((path, _, hi)) if *path == block => *hi = ix,
                _ => groups.push((block, ix, ix)),
            }
        }

        for (block, lo, hi) in groups.into_iter().rev() {
            self.wrap_children(&block, lo, hi, wrapper.clone())?;
        }
        Ok(())
    }

    pub fn add_mark(&mut self, format: &str) -> Result<(), ApplyError> {
        self.update_marks(|marks| {
            marks.insert(format);
        })
    }

    pub fn remove_mark(&mut self, format: &str) -> Result<(), ApplyError> {
        self.update_marks(|marks| {
            marks.remove(format);
        })
    }

    /// Collapsed selections queue the change for the next typed text.
    fn update_marks(&mut self, update: impl Fn(&mut Marks)) -> Result<(), ApplyError> {
        if self.selection().is_collapsed() {
            let mut marks = match self.pending_marks() {
                Some(marks) => marks.clone(),
                None => active_marks(self.doc(), self.registry(), self.selection()),
            };
            update(&mut marks);
            self.set_pending_marks(Some(marks));
            return Ok(());
        }

        for path in self.split_range_leaves()? {
            if void_above(self.doc(), self.registry(), &path).is_some() {
                continue;
            }
            let current = self.leaf_marks(&path);
            let mut marks = current.clone();
            update(&mut marks);
            if marks != current {
                self.apply(Op::SetTextMarks { path, marks })?;
            }
        }
        Ok(())
    }
}

/// Maximal subtrees lying strictly between the leaves at `start` and `end`,
/// in document order.
fn covered_subtrees(doc: &Document, start: &[usize], end: &[usize]) -> Vec<Path> {
    fn walk(
        doc: &Document,
        id: NodeId,
        path: &mut Vec<usize>,
        start: &[usize],
        end: &[usize],
        out: &mut Vec<Path>,
    ) {
        for (ix, child) in doc.children(id).iter().enumerate() {
            path.push(ix);
            let holds_edge = start.starts_with(path) || end.starts_with(path);
            if holds_edge {
                walk(doc, *child, path, start, end, out);
            } else if path.as_slice() > start && path.as_slice() < end {
                out.push(path.clone());
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(doc, doc.root(), &mut Vec::new(), start, end, &mut out);
    out
}
