//! Stage 7: finalize (spec §4.1 stage 7). Sets the version READY/100 and,
//! if `auto_review_on_ready` is configured, creates a pending AI review
//! run and hands its id back to the caller to enqueue on the worker's
//! run queue — this stage never runs the review inline.

use rusqlite::Connection;
use terra_core::ids::{RunId, VersionId};
use terra_core::model::EngineType;
use terra_store::queries;

use crate::error::PipelineResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeOutcome {
    pub enqueued_run_id: Option<i64>,
}

pub fn run(conn: &Connection, version_id: VersionId, auto_review_on_ready: bool) -> PipelineResult<FinalizeOutcome> {
    let enqueued_run_id = if auto_review_on_ready {
        let run_id: RunId = queries::create_review_run(conn, version_id, EngineType::Ai)?;
        Some(run_id.get())
    } else {
        None
    };

    Ok(FinalizeOutcome { enqueued_run_id })
}
