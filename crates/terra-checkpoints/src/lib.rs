//! # terra-checkpoints
//!
//! Checkpoint runner (component G): builds a `ReviewContext` once per
//! review run and dispatches enabled checkpoints to executors supplied by
//! the caller.

pub mod context;
pub mod error;
pub mod runner;

pub use context::{build_context, ReviewContext};
pub use error::{CheckpointError, CheckpointResult};
pub use runner::{isolate, run_checkpoints, Executor, ExecutorRegistry};
