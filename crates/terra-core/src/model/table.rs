use crate::ids::{OutlineNodeId, TableId, VersionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub version_id: VersionId,
    pub outline_node_id: Option<OutlineNodeId>,
    /// Inferred caption number, e.g. "3-1". Capped at 32 chars.
    pub table_no: Option<String>,
    pub title: Option<String>,
    pub n_rows: u32,
    pub n_cols: u32,
}

impl Table {
    pub const TABLE_NO_MAX: usize = 32;
    pub const TITLE_MAX: usize = 255;

    pub fn is_trivial(&self) -> bool {
        self.n_rows.saturating_mul(self.n_cols) <= 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub table_id: TableId,
    pub r: u32,
    pub c: u32,
    pub text: String,
    pub num_value: Option<f64>,
    pub unit: Option<String>,
}

impl TableCell {
    pub const TEXT_MAX: usize = 2000;
    pub const UNIT_MAX: usize = 32;
}

/// A table plus its cells, the shape most callers (fact extraction, rule
/// executors) actually want rather than joining on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableWithCells {
    pub table: Table,
    pub cells: Vec<TableCell>,
}

impl TableWithCells {
    pub fn cell(&self, r: u32, c: u32) -> Option<&TableCell> {
        self.cells.iter().find(|cell| cell.r == r && cell.c == c)
    }

    pub fn row(&self, r: u32) -> Vec<&TableCell> {
        let mut cells: Vec<&TableCell> = self.cells.iter().filter(|cell| cell.r == r).collect();
        cells.sort_by_key(|cell| cell.c);
        cells
    }

    pub fn column(&self, c: u32) -> Vec<&TableCell> {
        let mut cells: Vec<&TableCell> = self.cells.iter().filter(|cell| cell.c == c).collect();
        cells.sort_by_key(|cell| cell.r);
        cells
    }

    pub fn header_row(&self) -> Vec<&TableCell> {
        self.row(0)
    }
}
