//! Read queries and direct (non-batched) writes against a single
//! connection — used both by the pooled readers and, for small one-off
//! writes that need the freshly assigned row id back, a direct connection.

use crate::error::StoreResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use terra_core::ids::{BlockId, CheckpointId, KbChunkId, KbSourceId, OutlineNodeId, RunId, TableId, VersionId};
use terra_core::model::{
    Block, BlockType, Checkpoint, DocumentVersion, EngineType, Fact, FactScope, FactValue,
    KbChunk, KbSource, KbSourceStatus, OutlineNode, ReviewRun, RunStatus, Table, TableCell,
    TableWithCells, VersionStatus,
};

/// Deletes every row a pipeline stage owns for a version before it
/// re-derives them, implementing the "delete-then-insert" idempotency
/// contract stage by stage.
pub fn delete_structure(conn: &Connection, version_id: VersionId) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM doc_table_cell WHERE table_id IN (SELECT id FROM doc_table WHERE version_id = ?1)",
        params![version_id.get()],
    )?;
    conn.execute("DELETE FROM doc_block WHERE version_id = ?1", params![version_id.get()])?;
    conn.execute("DELETE FROM doc_table WHERE version_id = ?1", params![version_id.get()])?;
    conn.execute(
        "DELETE FROM doc_outline_node WHERE version_id = ?1",
        params![version_id.get()],
    )?;
    Ok(())
}

pub fn delete_anchors(conn: &Connection, version_id: VersionId) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM block_page_anchor WHERE block_id IN (SELECT id FROM doc_block WHERE version_id = ?1)",
        params![version_id.get()],
    )?;
    Ok(())
}

pub fn delete_facts(conn: &Connection, version_id: VersionId) -> StoreResult<()> {
    conn.execute("DELETE FROM fact WHERE version_id = ?1", params![version_id.get()])?;
    Ok(())
}

pub fn update_version_status(
    conn: &Connection,
    version_id: VersionId,
    status: VersionStatus,
    progress: u8,
    current_step: Option<&str>,
    error_message: Option<&str>,
) -> StoreResult<()> {
    conn.execute(
        "UPDATE document_version SET status=?2, progress=?3, current_step=?4, error_message=?5, updated_at=?6 WHERE id=?1",
        params![
            version_id.get(),
            format!("{:?}", status).to_uppercase(),
            progress,
            current_step,
            error_message,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn version_status_from_str(s: &str) -> VersionStatus {
    match s {
        "CONVERTING" => VersionStatus::Converting,
        "PARSING" => VersionStatus::Parsing,
        "ALIGNING" => VersionStatus::Aligning,
        "EXTRACTING_FACTS" => VersionStatus::ExtractingFacts,
        "READY" => VersionStatus::Ready,
        "FAILED" => VersionStatus::Failed,
        _ => VersionStatus::Uploaded,
    }
}

pub fn load_version(conn: &Connection, version_id: VersionId) -> StoreResult<Option<DocumentVersion>> {
    conn.query_row(
        "SELECT id, document_id, version_no, status, progress, current_step, error_message, \
         source_object_key, pdf_object_key, created_at, updated_at FROM document_version WHERE id = ?1",
        params![version_id.get()],
        |row| {
            let created_at: String = row.get(9)?;
            let updated_at: String = row.get(10)?;
            Ok(DocumentVersion {
                id: VersionId(row.get(0)?),
                document_id: terra_core::ids::DocumentId(row.get(1)?),
                version_no: row.get(2)?,
                status: version_status_from_str(&row.get::<_, String>(3)?),
                progress: row.get::<_, i64>(4)? as u8,
                current_step: row.get(5)?,
                error_message: row.get(6)?,
                source_object_key: row.get(7)?,
                pdf_object_key: row.get(8)?,
                created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
                updated_at: updated_at.parse().unwrap_or_else(|_| Utc::now()),
            })
        },
    )
    .optional()
}

pub fn project_id_for_document(conn: &Connection, document_id: terra_core::ids::DocumentId) -> StoreResult<i64> {
    Ok(conn.query_row(
        "SELECT project_id FROM document WHERE id = ?1",
        params![document_id.get()],
        |row| row.get(0),
    )?)
}

pub fn set_pdf_object_key(conn: &Connection, version_id: VersionId, key: &str) -> StoreResult<()> {
    conn.execute(
        "UPDATE document_version SET pdf_object_key = ?2 WHERE id = ?1",
        params![version_id.get(), key],
    )?;
    Ok(())
}

pub fn load_outline(conn: &Connection, version_id: VersionId) -> StoreResult<Vec<OutlineNode>> {
    let mut stmt = conn.prepare(
        "SELECT id, version_id, parent_id, level, node_no, title, order_index FROM doc_outline_node WHERE version_id = ?1 ORDER BY order_index",
    )?;
    let rows = stmt.query_map(params![version_id.get()], |row| {
        Ok(OutlineNode {
            id: OutlineNodeId(row.get(0)?),
            version_id: VersionId(row.get(1)?),
            parent_id: row.get::<_, Option<i64>>(2)?.map(OutlineNodeId),
            level: row.get::<_, i64>(3)? as u8,
            node_no: row.get(4)?,
            title: row.get(5)?,
            order_index: row.get(6)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn block_type_from_str(s: &str) -> BlockType {
    match s {
        "HEADING" => BlockType::Heading,
        "TABLE" => BlockType::Table,
        "LIST_ITEM" => BlockType::ListItem,
        "CAPTION" => BlockType::Caption,
        _ => BlockType::Para,
    }
}

pub fn load_blocks(conn: &Connection, version_id: VersionId) -> StoreResult<Vec<Block>> {
    let mut stmt = conn.prepare(
        "SELECT id, version_id, outline_node_id, block_type, order_index, text, table_id FROM doc_block WHERE version_id = ?1 ORDER BY order_index",
    )?;
    let rows = stmt.query_map(params![version_id.get()], |row| {
        let block_type: String = row.get(3)?;
        Ok(Block {
            id: BlockId(row.get(0)?),
            version_id: VersionId(row.get(1)?),
            outline_node_id: row.get::<_, Option<i64>>(2)?.map(OutlineNodeId),
            block_type: block_type_from_str(&block_type),
            order_index: row.get(4)?,
            text: row.get(5)?,
            table_id: row.get::<_, Option<i64>>(6)?.map(TableId),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Loads every persisted anchor for a version's blocks, keyed by block id,
/// for callers (the AI review driver, issue insertion) that need to resolve
/// a block's page without re-running the aligner.
pub fn load_page_anchors(
    conn: &Connection,
    version_id: VersionId,
) -> StoreResult<std::collections::HashMap<i64, terra_core::model::PageAnchor>> {
    let mut stmt = conn.prepare(
        "SELECT a.block_id, a.page_no, a.rect_x0, a.rect_y0, a.rect_x1, a.rect_y1, a.confidence \
         FROM block_page_anchor a JOIN doc_block b ON b.id = a.block_id WHERE b.version_id = ?1",
    )?;
    let rows = stmt.query_map(params![version_id.get()], |row| {
        let block_id: i64 = row.get(0)?;
        let page_no: Option<i64> = row.get(1)?;
        let x0: Option<f64> = row.get(2)?;
        let y0: Option<f64> = row.get(3)?;
        let x1: Option<f64> = row.get(4)?;
        let y1: Option<f64> = row.get(5)?;
        let confidence: f64 = row.get(6)?;
        let rect = match (x0, y0, x1, y1) {
            (Some(x0), Some(y0), Some(x1), Some(y1)) => Some(terra_core::model::RectPoints { x0, y0, x1, y1 }),
            _ => None,
        };
        Ok((
            block_id,
            terra_core::model::PageAnchor {
                block_id: BlockId(block_id),
                page_no: page_no.map(|p| p as u32),
                rect,
                confidence,
            },
        ))
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn load_tables_with_cells(conn: &Connection, version_id: VersionId) -> StoreResult<Vec<TableWithCells>> {
    let mut stmt = conn.prepare(
        "SELECT id, version_id, outline_node_id, table_no, title, n_rows, n_cols FROM doc_table WHERE version_id = ?1 ORDER BY id",
    )?;
    let tables = stmt.query_map(params![version_id.get()], |row| {
        Ok(Table {
            id: TableId(row.get(0)?),
            version_id: VersionId(row.get(1)?),
            outline_node_id: row.get::<_, Option<i64>>(2)?.map(OutlineNodeId),
            table_no: row.get(3)?,
            title: row.get(4)?,
            n_rows: row.get::<_, i64>(5)? as u32,
            n_cols: row.get::<_, i64>(6)? as u32,
        })
    })?;

    let mut cell_stmt = conn.prepare(
        "SELECT r, c, text, num_value, unit FROM doc_table_cell WHERE table_id = ?1 ORDER BY r, c",
    )?;

    let mut out = Vec::new();
    for table in tables {
        let table = table?;
        let cells = cell_stmt
            .query_map(params![table.id.get()], |row| {
                Ok(TableCell {
                    table_id: table.id,
                    r: row.get::<_, i64>(0)? as u32,
                    c: row.get::<_, i64>(1)? as u32,
                    text: row.get(2)?,
                    num_value: row.get(3)?,
                    unit: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        out.push(TableWithCells { table, cells });
    }
    Ok(out)
}

fn fact_value(value_num: Option<f64>, value_text: Option<String>) -> Option<FactValue> {
    match (value_num, value_text) {
        (Some(n), _) => Some(FactValue::Numeric(n)),
        (None, Some(t)) => Some(FactValue::Text(t)),
        (None, None) => None,
    }
}

pub fn load_facts(conn: &Connection, version_id: VersionId) -> StoreResult<Vec<Fact>> {
    let mut stmt = conn.prepare(
        "SELECT fact_key, scope, value_num, value_text, unit, confidence, source_block_id FROM fact WHERE version_id = ?1",
    )?;
    let rows = stmt.query_map(params![version_id.get()], |row| {
        let value_num: Option<f64> = row.get(2)?;
        let value_text: Option<String> = row.get(3)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            value_num,
            value_text,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, Option<i64>>(6)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (fact_key, scope, value_num, value_text, unit, confidence, source_block_id) = row?;
        if let Some(value) = fact_value(value_num, value_text) {
            out.push(Fact {
                version_id,
                fact_key,
                scope: FactScope(scope),
                value,
                unit,
                confidence,
                source_block_id,
            });
        }
    }
    Ok(out)
}

fn engine_type_from_str(s: &str) -> EngineType {
    match s {
        "AI" => EngineType::Ai,
        "SQL" => EngineType::Sql,
        _ => EngineType::Rule,
    }
}

pub fn load_enabled_checkpoints(conn: &Connection, engine_type: EngineType) -> StoreResult<Vec<Checkpoint>> {
    let et = match engine_type {
        EngineType::Rule => "RULE",
        EngineType::Ai => "AI",
        EngineType::Sql => "SQL",
    };
    let mut stmt = conn.prepare(
        "SELECT id, code, name, engine_type, enabled, order_index, rule_config_json FROM review_checkpoint WHERE enabled = 1 AND engine_type = ?1 ORDER BY order_index, id",
    )?;
    let rows = stmt.query_map(params![et], |row| {
        let rule_config_json: String = row.get(6)?;
        Ok(Checkpoint {
            id: CheckpointId(row.get(0)?),
            code: row.get(1)?,
            name: row.get(2)?,
            engine_type: engine_type_from_str(&row.get::<_, String>(3)?),
            enabled: row.get::<_, i64>(4)? != 0,
            order_index: row.get(5)?,
            rule_config: serde_json::from_str(&rule_config_json).unwrap_or(serde_json::json!({})),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn create_review_run(conn: &Connection, version_id: VersionId, engine_type: EngineType) -> StoreResult<RunId> {
    let et = match engine_type {
        EngineType::Rule => "RULE",
        EngineType::Ai => "AI",
        EngineType::Sql => "SQL",
    };
    conn.execute(
        "INSERT INTO review_run (version_id, engine_type, status) VALUES (?1, ?2, 'PENDING')",
        params![version_id.get(), et],
    )?;
    Ok(RunId(conn.last_insert_rowid()))
}

/// Loads every `PENDING` run of the given engine type, oldest first, for
/// the worker's run queue to pick up.
pub fn load_pending_review_runs(conn: &Connection, engine_type: EngineType) -> StoreResult<Vec<(RunId, VersionId)>> {
    let et = match engine_type {
        EngineType::Rule => "RULE",
        EngineType::Ai => "AI",
        EngineType::Sql => "SQL",
    };
    let mut stmt = conn.prepare(
        "SELECT id, version_id FROM review_run WHERE status = 'PENDING' AND engine_type = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![et], |row| Ok((RunId(row.get(0)?), VersionId(row.get(1)?))))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_run_status(
    conn: &Connection,
    run_id: RunId,
    status: RunStatus,
    started: bool,
    finished: bool,
    error_message: Option<&str>,
) -> StoreResult<()> {
    let status_str = match status {
        RunStatus::Pending => "PENDING",
        RunStatus::Running => "RUNNING",
        RunStatus::Succeeded => "DONE",
        RunStatus::Failed => "FAILED",
    };
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE review_run SET status=?2, started_at = CASE WHEN ?3 THEN ?4 ELSE started_at END, \
         finished_at = CASE WHEN ?5 THEN ?4 ELSE finished_at END, error_message = COALESCE(?6, error_message) WHERE id=?1",
        params![run_id.get(), status_str, started, now, finished, error_message],
    )?;
    Ok(())
}

fn kb_source_status_str(status: KbSourceStatus) -> &'static str {
    match status {
        KbSourceStatus::Pending => "PENDING",
        KbSourceStatus::Indexing => "INDEXING",
        KbSourceStatus::Ready => "READY",
        KbSourceStatus::Failed => "FAILED",
    }
}

fn kb_source_status_from_str(s: &str) -> KbSourceStatus {
    match s {
        "INDEXING" => KbSourceStatus::Indexing,
        "READY" => KbSourceStatus::Ready,
        "FAILED" => KbSourceStatus::Failed,
        _ => KbSourceStatus::Pending,
    }
}

pub fn create_kb_source(conn: &Connection, name: &str) -> StoreResult<KbSourceId> {
    conn.execute(
        "INSERT INTO kb_source (id, name, status, created_at) VALUES (?1, ?2, 'PENDING', ?3)",
        params![next_id(conn, "kb_source")?, name, Utc::now().to_rfc3339()],
    )?;
    Ok(KbSourceId(conn.last_insert_rowid()))
}

pub fn update_kb_source_status(
    conn: &Connection,
    kb_source_id: KbSourceId,
    status: KbSourceStatus,
    error_message: Option<&str>,
) -> StoreResult<()> {
    conn.execute(
        "UPDATE kb_source SET status=?2, error_message=?3 WHERE id=?1",
        params![kb_source_id.get(), kb_source_status_str(status), error_message],
    )?;
    Ok(())
}

pub fn load_kb_source(conn: &Connection, kb_source_id: KbSourceId) -> StoreResult<Option<KbSource>> {
    conn.query_row(
        "SELECT id, name, status, error_message, created_at FROM kb_source WHERE id = ?1",
        params![kb_source_id.get()],
        |row| {
            let created_at: String = row.get(4)?;
            Ok(KbSource {
                id: KbSourceId(row.get(0)?),
                name: row.get(1)?,
                status: kb_source_status_from_str(&row.get::<_, String>(2)?),
                error_message: row.get(3)?,
                created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
            })
        },
    )
    .optional()
}

pub fn delete_kb_chunks(conn: &Connection, kb_source_id: KbSourceId) -> StoreResult<()> {
    conn.execute("DELETE FROM kb_chunk WHERE kb_source_id = ?1", params![kb_source_id.get()])?;
    Ok(())
}

pub fn load_kb_chunks(conn: &Connection, kb_source_id: KbSourceId) -> StoreResult<Vec<KbChunk>> {
    let mut stmt = conn.prepare(
        "SELECT id, kb_source_id, chunk_index, text, char_start, char_end, page_start, page_end, hash \
         FROM kb_chunk WHERE kb_source_id = ?1 ORDER BY chunk_index",
    )?;
    let rows = stmt.query_map(params![kb_source_id.get()], |row| {
        Ok(KbChunk {
            id: KbChunkId(row.get(0)?),
            kb_source_id: KbSourceId(row.get(1)?),
            chunk_index: row.get::<_, i64>(2)? as u32,
            text: row.get(3)?,
            char_start: row.get::<_, i64>(4)? as u32,
            char_end: row.get::<_, i64>(5)? as u32,
            page_start: row.get::<_, Option<i64>>(6)?.map(|v| v as u32),
            page_end: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
            hash: row.get(8)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn next_id(conn: &Connection, table: &str) -> StoreResult<i64> {
    let max: Option<i64> = conn
        .query_row(&format!("SELECT MAX(id) FROM {table}"), [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(max.unwrap_or(0) + 1)
}
