//! # terra-ai
//!
//! AI Rule Driver (component I, spec §4.7): batches a norm library
//! against an external JSON-producing model, with bounded concurrency,
//! per-batch retry, a single requeue round, and issue mapping with
//! evidence validation.

pub mod batching;
pub mod client;
pub mod document;
pub mod driver;
pub mod error;
pub mod mapping;
pub mod norm;
pub mod prompts;

pub use client::{HttpModelClient, ModelClient};
pub use document::{assemble_document, DocBlock};
pub use driver::AiDriver;
pub use error::{AiError, AiResult};
pub use mapping::map_ai_issue;
pub use norm::{default_norm_library, NormRule};
pub use prompts::{AiIssue, ModelResponse, RULE_ENGINE_SYSTEM};
