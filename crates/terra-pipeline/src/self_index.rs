//! Stage 6: self-indexing (spec §4.1 stage 6). Builds KB chunks of the
//! document under review itself when `auto_index_self` is configured;
//! otherwise a no-op. Shares the chunker with the standalone KB Indexer
//! (`terra-kb`), which indexes external KB sources.

use rusqlite::Connection;
use terra_core::ids::VersionId;
use terra_store::{queries, BatchWriter};

use crate::error::PipelineResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelfIndexOutcome {
    pub chunk_count: usize,
    pub skipped: bool,
}

/// Joins a version's blocks into one flat document text with per-block
/// page boundaries (from stage 4's anchors, where resolved), then
/// chunks and indexes it under a KB source named after the version.
pub fn run(conn: &Connection, writer: &BatchWriter, version_id: VersionId, enabled: bool) -> PipelineResult<SelfIndexOutcome> {
    if !enabled {
        return Ok(SelfIndexOutcome { chunk_count: 0, skipped: true });
    }

    let blocks = queries::load_blocks(conn, version_id)?;
    let mut text = String::new();
    let mut boundaries: Vec<(usize, u32)> = Vec::new();
    for block in &blocks {
        if block.text.trim().is_empty() {
            continue;
        }
        if let Some(page_no) = page_no_for(conn, version_id, block.id)? {
            boundaries.push((text.chars().count(), page_no));
        }
        text.push_str(&block.text);
        text.push('\n');
    }

    let source_name = format!("version-{}-self-index", version_id.get());
    let kb_source_id = queries::create_kb_source(conn, &source_name)?;
    let outcome = terra_kb::index_source(conn, writer, kb_source_id, &text, &boundaries)?;

    Ok(SelfIndexOutcome {
        chunk_count: outcome.chunk_count,
        skipped: false,
    })
}

fn page_no_for(conn: &Connection, _version_id: VersionId, block_id: terra_core::ids::BlockId) -> PipelineResult<Option<u32>> {
    let page_no: Option<i64> = conn
        .query_row(
            "SELECT page_no FROM block_page_anchor WHERE block_id = ?1",
            rusqlite::params![block_id.get()],
            |row| row.get(0),
        )
        .ok()
        .flatten();
    Ok(page_no.map(|p| p as u32))
}
