//! Connection management: one dedicated write connection (wrapped by the
//! batch writer) plus a small pool of read-only connections, all against a
//! WAL-mode database so reads never block on the writer.

use crate::batch::BatchWriter;
use crate::error::StoreResult;
use crate::migrations;
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct DatabaseManager {
    path: String,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    writer: BatchWriter,
}

impl DatabaseManager {
    pub fn open(path: &str, min_pool: u32, max_pool: u32) -> StoreResult<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let write_conn = Connection::open(path)?;
        migrations::run(&write_conn)?;

        let pool_size = min_pool.max(1).min(max_pool.max(1)).max(1) as usize;
        let mut readers = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let conn = Connection::open(path)?;
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA query_only = ON;")?;
            readers.push(Mutex::new(conn));
        }

        Ok(Self {
            path: path.to_string(),
            readers,
            next_reader: AtomicUsize::new(0),
            writer: BatchWriter::new(write_conn),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn writer(&self) -> &BatchWriter {
        &self.writer
    }

    /// Runs `f` against a pooled read-only connection, round-robin.
    pub fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let guard = self.readers[idx].lock().expect("reader mutex poisoned");
        f(&guard)
    }

    /// Opens a fresh, unpooled connection for one-off write-and-wait
    /// operations (e.g. creating a version row and getting its id back)
    /// that don't fit the fire-and-forget batch path.
    pub fn open_direct(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}
