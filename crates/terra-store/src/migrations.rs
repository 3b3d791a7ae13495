//! Schema creation. One `CREATE TABLE IF NOT EXISTS` per entity in the data
//! model; run once at startup against the write connection.

use crate::error::StoreResult;
use rusqlite::Connection;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;

        CREATE TABLE IF NOT EXISTS project (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS document (
            id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL REFERENCES project(id),
            title TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS document_version (
            id INTEGER PRIMARY KEY,
            document_id INTEGER NOT NULL REFERENCES document(id),
            version_no INTEGER NOT NULL,
            status TEXT NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            current_step TEXT,
            error_message TEXT,
            source_object_key TEXT NOT NULL,
            pdf_object_key TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS doc_outline_node (
            id INTEGER PRIMARY KEY,
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            parent_id INTEGER REFERENCES doc_outline_node(id),
            level INTEGER NOT NULL,
            node_no TEXT,
            title TEXT NOT NULL,
            order_index INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_outline_version ON doc_outline_node(version_id, order_index);

        CREATE TABLE IF NOT EXISTS doc_table (
            id INTEGER PRIMARY KEY,
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            outline_node_id INTEGER REFERENCES doc_outline_node(id),
            table_no TEXT,
            title TEXT,
            n_rows INTEGER NOT NULL,
            n_cols INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS doc_table_cell (
            table_id INTEGER NOT NULL REFERENCES doc_table(id),
            r INTEGER NOT NULL,
            c INTEGER NOT NULL,
            text TEXT NOT NULL,
            num_value REAL,
            unit TEXT,
            PRIMARY KEY (table_id, r, c)
        );

        CREATE TABLE IF NOT EXISTS doc_block (
            id INTEGER PRIMARY KEY,
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            outline_node_id INTEGER REFERENCES doc_outline_node(id),
            block_type TEXT NOT NULL,
            order_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            table_id INTEGER REFERENCES doc_table(id)
        );
        CREATE INDEX IF NOT EXISTS idx_block_version ON doc_block(version_id, order_index);

        CREATE TABLE IF NOT EXISTS block_page_anchor (
            block_id INTEGER PRIMARY KEY REFERENCES doc_block(id),
            page_no INTEGER,
            rect_x0 REAL, rect_y0 REAL, rect_x1 REAL, rect_y1 REAL,
            confidence REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fact (
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            fact_key TEXT NOT NULL,
            scope TEXT NOT NULL,
            value_num REAL,
            value_text TEXT,
            unit TEXT,
            confidence REAL NOT NULL,
            source_block_id INTEGER,
            PRIMARY KEY (version_id, fact_key, scope)
        );

        CREATE TABLE IF NOT EXISTS review_checkpoint (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            engine_type TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            order_index INTEGER NOT NULL DEFAULT 0,
            rule_config_json TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS review_run (
            id INTEGER PRIMARY KEY,
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            engine_type TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT,
            finished_at TEXT,
            error_message TEXT
        );

        CREATE TABLE IF NOT EXISTS review_issue (
            id INTEGER PRIMARY KEY,
            version_id INTEGER NOT NULL REFERENCES document_version(id),
            run_id INTEGER NOT NULL REFERENCES review_run(id),
            checkpoint_code TEXT,
            issue_type TEXT NOT NULL,
            review_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'OPEN',
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            suggestion TEXT,
            confidence REAL NOT NULL,
            page_no INTEGER,
            evidence_block_ids_json TEXT NOT NULL DEFAULT '[]',
            evidence_quotes_json TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_issue_version ON review_issue(version_id, id DESC);

        CREATE TABLE IF NOT EXISTS kb_source (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            error_message TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS kb_chunk (
            id INTEGER PRIMARY KEY,
            kb_source_id INTEGER NOT NULL REFERENCES kb_source(id),
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            char_start INTEGER NOT NULL,
            char_end INTEGER NOT NULL,
            page_start INTEGER,
            page_end INTEGER,
            hash TEXT NOT NULL,
            UNIQUE (kb_source_id, hash)
        );
        "#,
    )?;
    Ok(())
}
