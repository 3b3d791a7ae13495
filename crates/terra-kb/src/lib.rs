//! # terra-kb
//!
//! KB Indexer (component K): chunks source text into overlapping,
//! content-hashed pieces and persists them against a `KbSource`. Shared
//! by the standalone KB corpus indexer and pipeline stage 6's
//! self-indexing of the document under review.

pub mod chunker;
pub mod error;
pub mod index;

pub use chunker::{chunk_text, content_hash, page_at, RawChunk, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use error::{KbError, KbResult};
pub use index::{index_source, mark_failed, IndexOutcome};
