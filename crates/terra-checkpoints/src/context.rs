//! Review execution context: built once per run, reused by every
//! checkpoint (spec §4.5) to avoid re-querying the store per check.

use rusqlite::Connection;
use std::collections::HashMap;
use terra_core::ids::{BlockId, OutlineNodeId, VersionId};
use terra_core::model::{Block, BlockType, Fact, OutlineNode, TableWithCells};
use terra_store::queries;

use crate::error::CheckpointResult;

pub struct ReviewContext {
    pub version_id: VersionId,
    pub outline_index: HashMap<OutlineNodeId, OutlineNode>,
    pub outline_order: Vec<OutlineNodeId>,
    pub blocks_by_id: HashMap<BlockId, Block>,
    pub blocks_by_outline: HashMap<OutlineNodeId, Vec<BlockId>>,
    pub tables: Vec<TableWithCells>,
    pub facts: HashMap<String, Vec<Fact>>,
    pub outline_heading_block_map: HashMap<OutlineNodeId, BlockId>,
}

impl ReviewContext {
    pub fn first_block_id(&self) -> Option<BlockId> {
        self.blocks_by_id
            .values()
            .min_by_key(|b| b.order_index)
            .map(|b| b.id)
    }

    pub fn heading_block_for(&self, outline_node_id: OutlineNodeId) -> Option<BlockId> {
        self.outline_heading_block_map.get(&outline_node_id).copied()
    }
}

/// Builds a `ReviewContext` in the load-bearing order: outline, then
/// blocks (so blocks can be grouped by outline), then tables, then facts,
/// then the outline-to-heading-block map — each step only reads data
/// already loaded by the previous one.
pub fn build_context(conn: &Connection, version_id: VersionId) -> CheckpointResult<ReviewContext> {
    let outline_nodes = queries::load_outline(conn, version_id)?;
    let outline_order: Vec<OutlineNodeId> = outline_nodes.iter().map(|n| n.id).collect();
    let outline_index: HashMap<OutlineNodeId, OutlineNode> =
        outline_nodes.into_iter().map(|n| (n.id, n)).collect();

    let blocks = queries::load_blocks(conn, version_id)?;
    let mut blocks_by_outline: HashMap<OutlineNodeId, Vec<BlockId>> = HashMap::new();
    let mut outline_heading_block_map: HashMap<OutlineNodeId, BlockId> = HashMap::new();
    for block in &blocks {
        if let Some(outline_id) = block.outline_node_id {
            blocks_by_outline.entry(outline_id).or_default().push(block.id);
            if block.block_type == BlockType::Heading {
                outline_heading_block_map.entry(outline_id).or_insert(block.id);
            }
        }
    }
    let blocks_by_id: HashMap<BlockId, Block> = blocks.into_iter().map(|b| (b.id, b)).collect();

    let tables = queries::load_tables_with_cells(conn, version_id)?;

    let fact_rows = queries::load_facts(conn, version_id)?;
    let mut facts: HashMap<String, Vec<Fact>> = HashMap::new();
    for fact in fact_rows {
        facts.entry(fact.fact_key.clone()).or_default().push(fact);
    }

    Ok(ReviewContext {
        version_id,
        outline_index,
        outline_order,
        blocks_by_id,
        blocks_by_outline,
        tables,
        facts,
        outline_heading_block_map,
    })
}
