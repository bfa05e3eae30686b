use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::arena::{Document, NodeId};
use crate::core::Selection;
use crate::node::{Attrs, ElementNode, IMAGE, LINK, Node, PARAGRAPH};
use crate::ops::{Op, child_path};

pub const HEADING_ONE: &str = "heading-one";
pub const HEADING_TWO: &str = "heading-two";
pub const BLOCK_QUOTE: &str = "block-quote";
pub const BULLETED_LIST: &str = "bulleted-list";
pub const NUMBERED_LIST: &str = "numbered-list";
pub const LIST_ITEM: &str = "list-item";
pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "tr";
pub const TABLE_CELL: &str = "td";
pub const TABLE_HEADER_CELL: &str = "th";

pub fn is_list_container(kind: &str) -> bool {
    kind == BULLETED_LIST || kind == NUMBERED_LIST
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
}

impl NodeSpec {
    fn text_block(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::InlineOnly,
        }
    }

    fn container(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::BlockOnly,
        }
    }
}

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

#[derive(Debug, Clone)]
pub struct TransactionPreview {
    pub doc: Document,
    pub selection: Selection,
}

pub trait SchemaPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugin_ids: Vec<&'static str>,
    node_specs: HashMap<String, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn SchemaPlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    fn core_plugins() -> Vec<Box<dyn SchemaPlugin>> {
        vec![Box::new(CoreParagraphPlugin), Box::new(CoreNormalizePlugin)]
    }

    pub fn core() -> Self {
        let mut registry = Self::default();
        for plugin in Self::core_plugins() {
            registry.register_builtin(plugin);
        }
        registry
    }

    /// Schema used by the journal editor: headings, quotes, lists, links,
    /// images and tables on top of the core plugins.
    pub fn journal() -> Self {
        let mut plugins = Self::core_plugins();
        plugins.extend([
            Box::new(HeadingPlugin) as Box<dyn SchemaPlugin>,
            Box::new(BlockquotePlugin),
            Box::new(ListPlugin),
            Box::new(LinkPlugin),
            Box::new(ImagePlugin),
            Box::new(TablePlugin),
        ]);
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_builtin(plugin);
        }
        registry
    }

    fn register_builtin(&mut self, plugin: Box<dyn SchemaPlugin>) {
        if let Err(err) = self.register_plugin(plugin) {
            tracing::warn!("builtin plugin rejected: {err}");
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn SchemaPlugin>) -> Result<(), String> {
        let specs = plugin.node_specs();
        for spec in &specs {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(format!("Duplicate node spec kind: {}", spec.kind));
            }
        }
        for spec in specs {
            self.node_specs.insert(spec.kind.clone(), spec);
        }

        self.normalize_passes.extend(plugin.normalize_passes());
        self.plugin_ids.push(plugin.id());

        Ok(())
    }

    pub fn plugin_ids(&self) -> &[&'static str] {
        &self.plugin_ids
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_specs.get(kind)
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.node_specs.contains_key(kind)
    }

    pub fn is_inline(&self, kind: &str) -> bool {
        self.spec(kind).is_some_and(|s| s.role == NodeRole::Inline)
    }

    pub fn is_void(&self, kind: &str) -> bool {
        self.spec(kind).is_some_and(|s| s.is_void)
    }

    /// Ops of the first pass that still finds something to fix. Each pass
    /// emits ops that stay valid when applied in order.
    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        for pass in &self.normalize_passes {
            let ops = pass.run(doc, self);
            if !ops.is_empty() {
                tracing::trace!(pass = pass.id(), ops = ops.len(), "normalize pass");
                return ops;
            }
        }
        Vec::new()
    }
}

/// Depth-first walk over every element, yielding its path and id.
fn for_each_element(doc: &Document, mut f: impl FnMut(&[usize], NodeId)) {
    fn walk(
        doc: &Document,
        id: NodeId,
        path: &mut Vec<usize>,
        f: &mut dyn FnMut(&[usize], NodeId),
    ) {
        for (ix, child) in doc.children(id).iter().enumerate() {
            if !doc.is_element(*child) {
                continue;
            }
            path.push(ix);
            f(path, *child);
            walk(doc, *child, path, f);
            path.pop();
        }
    }

    walk(doc, doc.root(), &mut Vec::new(), &mut f);
}

struct CoreParagraphPlugin;

impl SchemaPlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(PARAGRAPH)]
    }
}

struct CoreNormalizePlugin;

impl SchemaPlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(ResetVoidChildren),
            Box::new(EnsureElementsHaveTextLeaf),
            Box::new(PadInlineElements),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// A void element holds exactly one empty text leaf. Anything else that
/// ended up inside it is dropped.
struct ResetVoidChildren;

impl NormalizePass for ResetVoidChildren {
    fn id(&self) -> &'static str {
        "core.reset_void_children"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut dirty: Vec<(Vec<usize>, usize)> = Vec::new();
        for_each_element(doc, |path, id| {
            if !doc.kind(id).is_some_and(|kind| registry.is_void(kind)) {
                return;
            }
            if dirty.iter().any(|(outer, _)| path.starts_with(outer)) {
                return;
            }
            let children = doc.children(id);
            if !matches!(children, [only] if doc.text(*only) == Some("")) {
                dirty.push((path.to_vec(), children.len()));
            }
        });

        // Later voids first so earlier paths stay valid.
        let mut ops = Vec::new();
        for (path, len) in dirty.into_iter().rev() {
            for ix in (0..len).rev() {
                ops.push(Op::RemoveNode {
                    path: child_path(&path, ix),
                });
            }
            ops.push(Op::InsertNode {
                path: child_path(&path, 0),
                node: Node::text(""),
            });
        }
        ops
    }
}

struct EnsureElementsHaveTextLeaf;

impl NormalizePass for EnsureElementsHaveTextLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_elements_have_text_leaf"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element(doc, |path, id| {
            if !doc.children(id).is_empty() {
                return;
            }
            let wants_blocks = doc
                .kind(id)
                .and_then(|kind| registry.spec(kind))
                .is_some_and(|spec| spec.children == ChildConstraint::BlockOnly);
            if !wants_blocks {
                ops.push(Op::InsertNode {
                    path: child_path(path, 0),
                    node: Node::text(""),
                });
            }
        });
        ops
    }
}

/// Inline elements always sit between two text leaves so a caret can be
/// placed on either side of them.
struct PadInlineElements;

impl NormalizePass for PadInlineElements {
    fn id(&self) -> &'static str {
        "core.pad_inline_elements"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let is_inline = |id: NodeId| doc.kind(id).is_some_and(|kind| registry.is_inline(kind));

        let mut ops = Vec::new();
        for_each_element(doc, |path, id| {
            let children = doc.children(id);
            let mut local = Vec::new();
            if children.last().is_some_and(|last| is_inline(*last)) {
                local.push(Op::InsertNode {
                    path: child_path(path, children.len()),
                    node: Node::text(""),
                });
            }
            for ix in (0..children.len()).rev() {
                if !is_inline(children[ix]) {
                    continue;
                }
                let prev_is_text = ix > 0 && doc.is_text(children[ix - 1]);
                if !prev_is_text {
                    local.push(Op::InsertNode {
                        path: child_path(path, ix),
                        node: Node::text(""),
                    });
                }
            }
            ops.extend(local);
        });
        ops
    }
}

/// Adjacent text leaves with equal marks are merged; an empty leaf next to
/// a differently marked one is dropped.
struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element(doc, |path, id| {
            let children = doc.children(id);
            let mut ix = children.len();
            while ix > 1 {
                ix -= 1;
                let (prev, cur) = (children[ix - 1], children[ix]);
                let (Some(prev_marks), Some(cur_marks)) = (doc.marks(prev), doc.marks(cur)) else {
                    continue;
                };
                let is_empty = |id: NodeId| doc.text(id).is_some_and(str::is_empty);

                if prev_marks == cur_marks {
                    ops.push(Op::MergeText {
                        path: child_path(path, ix),
                    });
                } else if is_empty(cur) {
                    ops.push(Op::RemoveNode {
                        path: child_path(path, ix),
                    });
                } else if is_empty(prev) {
                    ops.push(Op::RemoveNode {
                        path: child_path(path, ix - 1),
                    });
                    // The next pair would address shifted siblings.
                    ix -= 1;
                }
            }
        });
        ops
    }
}

struct HeadingPlugin;

impl SchemaPlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::text_block(HEADING_ONE),
            NodeSpec::text_block(HEADING_TWO),
        ]
    }
}

struct BlockquotePlugin;

impl SchemaPlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(BLOCK_QUOTE)]
    }
}

struct ListPlugin;

impl SchemaPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container(BULLETED_LIST),
            NodeSpec::container(NUMBERED_LIST),
            NodeSpec::text_block(LIST_ITEM),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeListStructure)]
    }
}

/// List containers are never empty and list items never float outside one.
struct NormalizeListStructure;

impl NormalizePass for NormalizeListStructure {
    fn id(&self) -> &'static str {
        "list.normalize_structure"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();

        fn walk(doc: &Document, id: NodeId, path: &mut Vec<usize>, ops: &mut Vec<Op>) {
            let parent_is_list = doc.kind(id).is_some_and(is_list_container);
            let children = doc.children(id);

            for (ix, child) in children.iter().enumerate() {
                if doc.is_element(*child) {
                    path.push(ix);
                    walk(doc, *child, path, ops);
                    path.pop();
                }
            }

            for ix in (0..children.len()).rev() {
                let child = children[ix];
                let Some(kind) = doc.kind(child) else {
                    continue;
                };
                if is_list_container(kind) && doc.children(child).is_empty() {
                    ops.push(Op::RemoveNode {
                        path: child_path(path, ix),
                    });
                } else if kind == LIST_ITEM && !parent_is_list {
                    ops.push(Op::InsertNode {
                        path: child_path(path, ix),
                        node: Node::element(BULLETED_LIST, Vec::new()),
                    });
                    ops.push(Op::MoveNode {
                        from: child_path(path, ix + 1),
                        to: child_path(&child_path(path, ix), 0),
                    });
                }
            }
        }

        walk(doc, doc.root(), &mut Vec::new(), &mut ops);
        ops
    }
}

struct LinkPlugin;

impl SchemaPlugin for LinkPlugin {
    fn id(&self) -> &'static str {
        "link"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec {
            kind: LINK.to_string(),
            role: NodeRole::Inline,
            is_void: false,
            children: ChildConstraint::InlineOnly,
        }]
    }
}

struct ImagePlugin;

impl SchemaPlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec {
            kind: IMAGE.to_string(),
            role: NodeRole::Block,
            is_void: true,
            children: ChildConstraint::None,
        }]
    }
}

struct TablePlugin;

impl SchemaPlugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container(TABLE),
            NodeSpec::container(TABLE_ROW),
            NodeSpec::container(TABLE_CELL),
            NodeSpec::container(TABLE_HEADER_CELL),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeTableStructure)]
    }
}

pub fn table_cell_node(kind: &str) -> Node {
    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs: Attrs::default(),
        children: vec![Node::paragraph("")],
    })
}

pub fn table_row_node(cols: usize, cell_kind: &str) -> Node {
    let cols = cols.max(1);
    Node::element(
        TABLE_ROW,
        (0..cols).map(|_| table_cell_node(cell_kind)).collect(),
    )
}

fn is_cell(kind: &str) -> bool {
    kind == TABLE_CELL || kind == TABLE_HEADER_CELL
}

struct NormalizeTableStructure;

impl NormalizePass for NormalizeTableStructure {
    fn id(&self) -> &'static str {
        "table.normalize_structure"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();

        fn normalize_table(doc: &Document, table: NodeId, path: &[usize], ops: &mut Vec<Op>) {
            let rows = doc.children(table);
            if rows.is_empty() {
                ops.push(Op::InsertNode {
                    path: child_path(path, 0),
                    node: table_row_node(1, TABLE_CELL),
                });
                return;
            }

            let is_row = |id: NodeId| doc.kind(id) == Some(TABLE_ROW);
            let max_cols = rows
                .iter()
                .filter(|r| is_row(**r))
                .map(|r| doc.children(*r).len().max(1))
                .max()
                .unwrap_or(1);

            for (row_ix, row) in rows.iter().enumerate() {
                if !is_row(*row) {
                    continue;
                }
                let row_path = child_path(path, row_ix);
                let cells = doc.children(*row);

                for col_ix in cells.len()..max_cols {
                    ops.push(Op::InsertNode {
                        path: child_path(&row_path, col_ix),
                        node: table_cell_node(TABLE_CELL),
                    });
                }

                for (cell_ix, cell) in cells.iter().enumerate() {
                    if !doc.kind(*cell).is_some_and(is_cell) {
                        continue;
                    }
                    if doc.children(*cell).is_empty() {
                        ops.push(Op::InsertNode {
                            path: child_path(&child_path(&row_path, cell_ix), 0),
                            node: Node::paragraph(""),
                        });
                    }
                }
            }
        }

        for_each_element(doc, |path, id| {
            if doc.kind(id) == Some(TABLE) {
                normalize_table(doc, id, path, &mut ops);
            }
        });

        ops
    }
}
