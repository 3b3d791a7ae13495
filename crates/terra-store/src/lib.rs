//! # terra-store
//!
//! SQLite persistence layer for the ingestion and review pipeline.
//! WAL mode, write-serialized + read-pooled, batch writer, schema
//! migrations. Mirrors the single-writer/pooled-reader shape the original
//! service used against Postgres, adapted to an embedded SQLite file.

pub mod batch;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod queries;

pub use batch::{BatchWriter, Row, WriteStats};
pub use connection::DatabaseManager;
pub use error::{StoreError, StoreResult};
