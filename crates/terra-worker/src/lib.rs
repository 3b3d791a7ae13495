//! # terra-worker
//!
//! Wiring and background worker pool: builds the concrete trait objects
//! every other crate dispatches through, runs ingest pipelines on a bounded
//! pool, and drains the AI review run queue `terra-pipeline`'s finalize
//! stage feeds.

pub mod error;
pub mod pool;
pub mod queue;
pub mod wiring;

pub use error::{WorkerError, WorkerResult};
pub use pool::IngestPool;
pub use queue::ReviewQueue;
pub use wiring::AppContext;
