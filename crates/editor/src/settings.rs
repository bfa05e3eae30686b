use journaly_document::{EditorConfig, Node, TABLE, TABLE_CELL, TABLE_HEADER_CELL, table_row_node};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::locale::Catalog;

/// Size of the table inserted by the `insert-table` action. Node kinds are
/// the journal schema's `table`, `tr`, `td` and `th`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    pub rows: usize,
    pub cols: usize,
    pub header_row: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            header_row: false,
        }
    }
}

impl TableOptions {
    /// A `rows` by `cols` table whose cells each hold an empty paragraph.
    pub fn empty_table(&self) -> Node {
        let rows = (0..self.rows.max(1))
            .map(|ix| {
                let cell = if ix == 0 && self.header_row {
                    TABLE_HEADER_CELL
                } else {
                    TABLE_CELL
                };
                table_row_node(self.cols, cell)
            })
            .collect();
        Node::element(TABLE, rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
    pub table: TableOptions,
    /// Empty means untranslated: English fallbacks are shown.
    pub messages: Catalog,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_undo: 200,
            max_normalize_iterations: 100,
            table: TableOptions::default(),
            messages: Catalog::default(),
        }
    }
}

impl EditorSettings {
    pub fn from_json_str(s: &str) -> Result<Self, DispatchError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            max_undo: self.max_undo,
            max_normalize_iterations: self.max_normalize_iterations,
        }
        .with_defaults()
    }
}
