//! Stage 4: block-to-page alignment (spec §4.1 stage 4). Wraps
//! `terra_align::Aligner` over the blocks already persisted by stage 2 and
//! the page layouts produced by stage 3, and writes back one
//! `PageAnchor` per block.

use rusqlite::Connection;
use terra_align::{AlignInput, AlignStats, Aligner, PdfPageLayout};
use terra_core::ids::VersionId;
use terra_core::model::{Block, BlockType, TableWithCells};
use terra_store::{queries, BatchWriter, Row};

use crate::error::PipelineResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlignOutcome {
    pub anchored: u64,
    pub total: u64,
}

fn search_text_for(block: &Block, tables: &[TableWithCells]) -> String {
    if block.block_type == BlockType::Table {
        if let Some(table_id) = block.table_id {
            if let Some(t) = tables.iter().find(|t| t.table.id == table_id) {
                let label = format!(
                    "{} {}",
                    t.table.table_no.clone().unwrap_or_default(),
                    t.table.title.clone().unwrap_or_default()
                );
                return label.trim().to_string();
            }
        }
        return String::new();
    }
    block.text.clone()
}

/// Aligns every block of a version against the given page layouts (empty
/// if stage 3 produced nothing), persisting one anchor per block.
pub fn run(conn: &Connection, writer: &BatchWriter, version_id: VersionId, pages: &[PdfPageLayout]) -> PipelineResult<AlignOutcome> {
    queries::delete_anchors(conn, version_id)?;

    let blocks = queries::load_blocks(conn, version_id)?;
    let tables = queries::load_tables_with_cells(conn, version_id)?;

    let mut aligner = Aligner::new(pages);
    let mut outcome = AlignOutcome::default();

    for block in &blocks {
        let search_text = search_text_for(block, &tables);
        let anchor = if search_text.trim().is_empty() {
            terra_core::model::PageAnchor::unanchored(block.id)
        } else {
            aligner.align(&AlignInput {
                block_id: block.id,
                search_text,
            })
        };

        outcome.total += 1;
        if anchor.page_no.is_some() {
            outcome.anchored += 1;
        }

        writer.send(Row::PageAnchor {
            block_id: anchor.block_id.get(),
            page_no: anchor.page_no.map(|p| p as i64),
            rect: anchor.rect.map(|r| (r.x0, r.y0, r.x1, r.y1)),
            confidence: anchor.confidence,
        })?;
    }

    writer.flush_sync()?;
    tracing::info!(stats = ?stats_of(&aligner), anchored = outcome.anchored, total = outcome.total, "block alignment complete");
    Ok(outcome)
}

fn stats_of(aligner: &Aligner<'_>) -> AlignStats {
    aligner.stats()
}
