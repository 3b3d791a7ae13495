//! Checkpoint dispatch: looks up enabled checkpoints for an engine type
//! and runs each through a caller-supplied executor registry (spec §4.5).
//! The registry is passed in rather than imported so this crate never
//! depends on the crate that defines the rule executors.

use rusqlite::Connection;
use std::collections::HashMap;
use terra_core::model::{EngineType, IssueDraft};
use tracing::{error, info, warn};

use crate::context::ReviewContext;
use crate::error::CheckpointResult;

pub type Executor = fn(&ReviewContext, &serde_json::Value) -> Vec<IssueDraft>;
pub type ExecutorRegistry = HashMap<&'static str, Executor>;

/// Runs every enabled checkpoint of `engine_type`, returning each issue
/// draft paired with the checkpoint code that produced it. An unknown
/// executor name is logged and skipped; an executor that would panic is
/// not protected against here (sub-check-level isolation belongs to the
/// executor itself, per spec §4.6) but a missing registry entry never
/// aborts the run.
pub fn run_checkpoints(
    conn: &Connection,
    context: &ReviewContext,
    engine_type: EngineType,
    registry: &ExecutorRegistry,
) -> CheckpointResult<Vec<(IssueDraft, String)>> {
    let checkpoints = terra_store::queries::load_enabled_checkpoints(conn, engine_type)?;
    if checkpoints.is_empty() {
        warn!(version_id = context.version_id.get(), ?engine_type, "no checkpoints found");
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for checkpoint in checkpoints {
        let executor_name = checkpoint
            .rule_config
            .get("executor")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| checkpoint.code.to_lowercase());

        let Some(executor) = registry.get(executor_name.as_str()) else {
            warn!(checkpoint = %checkpoint.code, executor = %executor_name, "unknown executor, skipping");
            continue;
        };

        let drafts = executor(context, &checkpoint.rule_config);
        info!(checkpoint = %checkpoint.code, executor = %executor_name, issues = drafts.len(), "checkpoint ran");
        for draft in drafts {
            out.push((draft, checkpoint.code.clone()));
        }
    }
    Ok(out)
}

/// Wraps an executor body so a returned `Err` is logged and treated as
/// "no issues" instead of propagating — used by executors that need
/// fallible sub-steps (table lookups, parsing) without aborting siblings.
pub fn isolate<E: std::fmt::Display>(
    checkpoint_code: &str,
    result: Result<Vec<IssueDraft>, E>,
) -> Vec<IssueDraft> {
    match result {
        Ok(drafts) => drafts,
        Err(err) => {
            error!(checkpoint = checkpoint_code, %err, "checkpoint sub-check failed");
            Vec::new()
        }
    }
}
