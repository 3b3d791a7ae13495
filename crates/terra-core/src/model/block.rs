use crate::ids::{BlockId, OutlineNodeId, TableId, VersionId};
use crate::model::rect::RectPoints;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Heading,
    Para,
    Table,
    ListItem,
    Caption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub version_id: VersionId,
    pub outline_node_id: Option<OutlineNodeId>,
    pub block_type: BlockType,
    pub order_index: i64,
    pub text: String,
    pub table_id: Option<TableId>,
}

impl Block {
    pub const TEXT_MAX: usize = 4000;
}

/// Result of the block-to-page aligner for a single block: the resolved page
/// (if any), bounding rectangle on that page, and a confidence in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAnchor {
    pub block_id: BlockId,
    pub page_no: Option<u32>,
    pub rect: Option<RectPoints>,
    pub confidence: f64,
}

impl PageAnchor {
    pub fn unanchored(block_id: BlockId) -> Self {
        Self {
            block_id,
            page_no: None,
            rect: None,
            confidence: 0.0,
        }
    }
}
