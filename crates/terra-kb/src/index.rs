//! KB source indexing (component K, spec §4.9): chunks a source's text
//! and persists the chunks, delete-then-insert per source.

use rusqlite::Connection;
use terra_core::ids::KbSourceId;
use terra_core::model::KbSourceStatus;
use terra_store::{queries, BatchWriter, Row};

use crate::chunker::{chunk_text, content_hash, page_at, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::KbResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOutcome {
    pub chunk_count: usize,
}

/// Indexes one KB source's full text, replacing any chunks it previously
/// had. `page_boundaries` maps char offsets to page numbers for sources
/// with a page concept (e.g. a document re-indexed via stage 6); pass an
/// empty slice for sources without one.
pub fn index_source(
    conn: &Connection,
    writer: &BatchWriter,
    kb_source_id: KbSourceId,
    text: &str,
    page_boundaries: &[(usize, u32)],
) -> KbResult<IndexOutcome> {
    queries::update_kb_source_status(conn, kb_source_id, KbSourceStatus::Indexing, None)?;
    queries::delete_kb_chunks(conn, kb_source_id)?;

    let chunks = chunk_text(text, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP);
    for (idx, chunk) in chunks.iter().enumerate() {
        let page_start = if page_boundaries.is_empty() {
            None
        } else {
            page_at(chunk.char_start, page_boundaries)
        };
        let page_end = if page_boundaries.is_empty() {
            None
        } else {
            page_at(chunk.char_end.saturating_sub(1), page_boundaries)
        };
        writer.send(Row::KbChunk {
            kb_source_id: kb_source_id.get(),
            chunk_index: idx as i64,
            text: chunk.text.clone(),
            char_start: chunk.char_start as i64,
            char_end: chunk.char_end as i64,
            page_start: page_start.map(|p| p as i64),
            page_end: page_end.map(|p| p as i64),
            hash: content_hash(&chunk.text),
        })?;
    }
    writer.flush_sync()?;

    queries::update_kb_source_status(conn, kb_source_id, KbSourceStatus::Ready, None)?;
    Ok(IndexOutcome { chunk_count: chunks.len() })
}

/// Marks a source failed with a truncated error message, used by callers
/// when text extraction (not chunking, which cannot fail) errors out
/// before `index_source` is reached.
pub fn mark_failed(conn: &Connection, kb_source_id: KbSourceId, message: &str) -> KbResult<()> {
    let truncated: String = message.chars().take(2000).collect();
    queries::update_kb_source_status(conn, kb_source_id, KbSourceStatus::Failed, Some(&truncated))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_store::DatabaseManager;

    #[test]
    fn indexes_a_source_and_marks_it_ready() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("kb.db").to_string_lossy().to_string();
        let db = DatabaseManager::open(&db_path, 1, 1).unwrap();
        let conn = db.open_direct().unwrap();

        let source_id = queries::create_kb_source(&conn, "test-source").unwrap();
        let text = "段落内容。".repeat(200);
        let outcome = index_source(&conn, db.writer(), source_id, &text, &[]).unwrap();
        assert!(outcome.chunk_count > 1);

        let loaded = queries::load_kb_source(&conn, source_id).unwrap().unwrap();
        assert_eq!(loaded.status, KbSourceStatus::Ready);

        let chunks = queries::load_kb_chunks(&conn, source_id).unwrap();
        assert_eq!(chunks.len(), outcome.chunk_count);
    }

    #[test]
    fn reindexing_replaces_previous_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("kb.db").to_string_lossy().to_string();
        let db = DatabaseManager::open(&db_path, 1, 1).unwrap();
        let conn = db.open_direct().unwrap();

        let source_id = queries::create_kb_source(&conn, "test-source").unwrap();
        index_source(&conn, db.writer(), source_id, &"一二三四五".repeat(500), &[]).unwrap();
        let second = index_source(&conn, db.writer(), source_id, "短文本", &[]).unwrap();
        assert_eq!(second.chunk_count, 1);

        let chunks = queries::load_kb_chunks(&conn, source_id).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
