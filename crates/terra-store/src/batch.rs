//! Single-writer batch commit queue.
//!
//! WAL mode lets many readers run against their own connections while a
//! single writer thread drains a bounded channel and commits in batches —
//! this is the shape the ingestion pipeline needs: stage 2 alone can emit
//! thousands of block/cell rows for one version, and committing each row
//! individually would serialize the whole pipeline on fsync latency.

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

const CHANNEL_BOUND: usize = 1024;
const BATCH_SIZE: usize = 500;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum Row {
    OutlineNode {
        id: i64,
        version_id: i64,
        parent_id: Option<i64>,
        level: i64,
        node_no: Option<String>,
        title: String,
        order_index: i64,
    },
    Table {
        id: i64,
        version_id: i64,
        outline_node_id: Option<i64>,
        table_no: Option<String>,
        title: Option<String>,
        n_rows: i64,
        n_cols: i64,
    },
    TableCell {
        table_id: i64,
        r: i64,
        c: i64,
        text: String,
        num_value: Option<f64>,
        unit: Option<String>,
    },
    Block {
        id: i64,
        version_id: i64,
        outline_node_id: Option<i64>,
        block_type: String,
        order_index: i64,
        text: String,
        table_id: Option<i64>,
    },
    PageAnchor {
        block_id: i64,
        page_no: Option<i64>,
        rect: Option<(f64, f64, f64, f64)>,
        confidence: f64,
    },
    Fact {
        version_id: i64,
        fact_key: String,
        scope: String,
        value_num: Option<f64>,
        value_text: Option<String>,
        unit: Option<String>,
        confidence: f64,
        source_block_id: Option<i64>,
    },
    Issue {
        id: i64,
        version_id: i64,
        run_id: i64,
        checkpoint_code: Option<String>,
        issue_type: String,
        review_type: String,
        severity: String,
        title: String,
        description: String,
        suggestion: Option<String>,
        confidence: f64,
        page_no: Option<i64>,
        evidence_block_ids_json: String,
        evidence_quotes_json: String,
        created_at: String,
    },
    KbChunk {
        kb_source_id: i64,
        chunk_index: i64,
        text: String,
        char_start: i64,
        char_end: i64,
        page_start: Option<i64>,
        page_end: Option<i64>,
        hash: String,
    },
}

enum BatchCommand {
    Write(Row),
    Flush,
    FlushSync(std_mpsc::SyncSender<()>),
    Shutdown,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WriteStats {
    pub outline_node_rows: u64,
    pub table_rows: u64,
    pub table_cell_rows: u64,
    pub block_rows: u64,
    pub page_anchor_rows: u64,
    pub fact_rows: u64,
    pub issue_rows: u64,
    pub kb_chunk_rows: u64,
    pub flushes: u64,
}

pub struct BatchWriter {
    tx: crossbeam_channel::Sender<BatchCommand>,
    handle: Option<JoinHandle<()>>,
}

impl BatchWriter {
    pub fn new(conn: Connection) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_BOUND);
        let handle = std::thread::Builder::new()
            .name("terra-batch-writer".into())
            .spawn(move || writer_loop(conn, rx))
            .expect("spawn batch writer thread");
        Self {
            tx,
            handle: Some(handle),
        }
    }

    pub fn send(&self, row: Row) -> StoreResult<()> {
        self.tx
            .send(BatchCommand::Write(row))
            .map_err(|_| StoreError::WriterClosed)
    }

    /// Fire-and-forget: asks the writer to flush its current buffer soon.
    pub fn flush(&self) -> StoreResult<()> {
        self.tx
            .send(BatchCommand::Flush)
            .map_err(|_| StoreError::WriterClosed)
    }

    /// Blocks until every row sent before this call has been committed.
    pub fn flush_sync(&self) -> StoreResult<()> {
        let (reply_tx, reply_rx) = std_mpsc::sync_channel(0);
        self.tx
            .send(BatchCommand::FlushSync(reply_tx))
            .map_err(|_| StoreError::WriterClosed)?;
        reply_rx.recv().map_err(|_| StoreError::WriterReplyLost)
    }

    pub fn shutdown(&mut self) {
        let _ = self.tx.send(BatchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn writer_loop(mut conn: Connection, rx: crossbeam_channel::Receiver<BatchCommand>) {
    let mut buf: Vec<Row> = Vec::with_capacity(BATCH_SIZE);
    let mut stats = WriteStats::default();

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(BatchCommand::Write(row)) => {
                buf.push(row);
                if buf.len() >= BATCH_SIZE {
                    commit(&mut conn, &mut buf, &mut stats);
                }
            }
            Ok(BatchCommand::Flush) => {
                commit(&mut conn, &mut buf, &mut stats);
            }
            Ok(BatchCommand::FlushSync(reply)) => {
                commit(&mut conn, &mut buf, &mut stats);
                let _ = reply.send(());
            }
            Ok(BatchCommand::Shutdown) => {
                commit(&mut conn, &mut buf, &mut stats);
                break;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if !buf.is_empty() {
                    commit(&mut conn, &mut buf, &mut stats);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                commit(&mut conn, &mut buf, &mut stats);
                break;
            }
        }
    }
    tracing::info!(?stats, "terra-batch-writer stopped");
}

fn commit(conn: &mut Connection, buf: &mut Vec<Row>, stats: &mut WriteStats) {
    if buf.is_empty() {
        return;
    }
    let tx = match conn.transaction() {
        Ok(tx) => tx,
        Err(err) => {
            tracing::error!(%err, "failed to open batch transaction, dropping buffered rows");
            buf.clear();
            return;
        }
    };
    for row in buf.drain(..) {
        if let Err(err) = write_row(&tx, &row, stats) {
            tracing::error!(%err, "row write failed inside batch, skipping row");
        }
    }
    if let Err(err) = tx.commit() {
        tracing::error!(%err, "batch commit failed");
    }
    stats.flushes += 1;
}

fn write_row(conn: &Connection, row: &Row, stats: &mut WriteStats) -> rusqlite::Result<()> {
    match row {
        Row::OutlineNode {
            id,
            version_id,
            parent_id,
            level,
            node_no,
            title,
            order_index,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO doc_outline_node (id, version_id, parent_id, level, node_no, title, order_index) VALUES (?1,?2,?3,?4,?5,?6,?7)",
                rusqlite::params![id, version_id, parent_id, level, node_no, title, order_index],
            )?;
            stats.outline_node_rows += 1;
        }
        Row::Table {
            id,
            version_id,
            outline_node_id,
            table_no,
            title,
            n_rows,
            n_cols,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO doc_table (id, version_id, outline_node_id, table_no, title, n_rows, n_cols) VALUES (?1,?2,?3,?4,?5,?6,?7)",
                rusqlite::params![id, version_id, outline_node_id, table_no, title, n_rows, n_cols],
            )?;
            stats.table_rows += 1;
        }
        Row::TableCell {
            table_id,
            r,
            c,
            text,
            num_value,
            unit,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO doc_table_cell (table_id, r, c, text, num_value, unit) VALUES (?1,?2,?3,?4,?5,?6)",
                rusqlite::params![table_id, r, c, text, num_value, unit],
            )?;
            stats.table_cell_rows += 1;
        }
        Row::Block {
            id,
            version_id,
            outline_node_id,
            block_type,
            order_index,
            text,
            table_id,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO doc_block (id, version_id, outline_node_id, block_type, order_index, text, table_id) VALUES (?1,?2,?3,?4,?5,?6,?7)",
                rusqlite::params![id, version_id, outline_node_id, block_type, order_index, text, table_id],
            )?;
            stats.block_rows += 1;
        }
        Row::PageAnchor {
            block_id,
            page_no,
            rect,
            confidence,
        } => {
            let (x0, y0, x1, y1) = rect
                .map(|(a, b, c, d)| (Some(a), Some(b), Some(c), Some(d)))
                .unwrap_or((None, None, None, None));
            conn.execute(
                "INSERT OR REPLACE INTO block_page_anchor (block_id, page_no, rect_x0, rect_y0, rect_x1, rect_y1, confidence) VALUES (?1,?2,?3,?4,?5,?6,?7)",
                rusqlite::params![block_id, page_no, x0, y0, x1, y1, confidence],
            )?;
            stats.page_anchor_rows += 1;
        }
        Row::Fact {
            version_id,
            fact_key,
            scope,
            value_num,
            value_text,
            unit,
            confidence,
            source_block_id,
        } => {
            conn.execute(
                "INSERT INTO fact (version_id, fact_key, scope, value_num, value_text, unit, confidence, source_block_id) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8) \
                 ON CONFLICT(version_id, fact_key, scope) DO UPDATE SET \
                 value_num=excluded.value_num, value_text=excluded.value_text, unit=excluded.unit, \
                 confidence=excluded.confidence, source_block_id=excluded.source_block_id",
                rusqlite::params![version_id, fact_key, scope, value_num, value_text, unit, confidence, source_block_id],
            )?;
            stats.fact_rows += 1;
        }
        Row::Issue {
            id,
            version_id,
            run_id,
            checkpoint_code,
            issue_type,
            review_type,
            severity,
            title,
            description,
            suggestion,
            confidence,
            page_no,
            evidence_block_ids_json,
            evidence_quotes_json,
            created_at,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO review_issue \
                 (id, version_id, run_id, checkpoint_code, issue_type, review_type, severity, status, title, description, suggestion, confidence, page_no, evidence_block_ids_json, evidence_quotes_json, created_at) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,'OPEN',?8,?9,?10,?11,?12,?13,?14,?15)",
                rusqlite::params![id, version_id, run_id, checkpoint_code, issue_type, review_type, severity, title, description, suggestion, confidence, page_no, evidence_block_ids_json, evidence_quotes_json, created_at],
            )?;
            stats.issue_rows += 1;
        }
        Row::KbChunk {
            kb_source_id,
            chunk_index,
            text,
            char_start,
            char_end,
            page_start,
            page_end,
            hash,
        } => {
            conn.execute(
                "INSERT INTO kb_chunk (kb_source_id, chunk_index, text, char_start, char_end, page_start, page_end, hash) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8) ON CONFLICT (kb_source_id, hash) DO NOTHING",
                rusqlite::params![kb_source_id, chunk_index, text, char_start, char_end, page_start, page_end, hash],
            )?;
            stats.kb_chunk_rows += 1;
        }
    }
    Ok(())
}
