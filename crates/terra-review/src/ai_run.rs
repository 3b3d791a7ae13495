//! AI-engine review run (spec §4.7): the norm library is simply every
//! enabled checkpoint with `engine_type = AI` — each checkpoint's
//! `rule_config` carries the `review_type` (and optional `compare_mode`)
//! a plain RULE checkpoint would carry as `executor`/`only_checks`
//! instead, reusing the same checkpoint table rather than a second one.

use std::sync::Arc;

use rusqlite::Connection;
use terra_ai::{AiDriver, DocBlock, ModelClient, NormRule};
use terra_core::config::AiConfig;
use terra_core::ids::{RunId, VersionId};
use terra_core::model::{BlockType, Checkpoint, EngineType, ReviewType, RunStatus};
use terra_store::{queries, BatchWriter};
use tracing::info;

use crate::error::ReviewResult;
use crate::insertion::insert_issues;

#[derive(Debug, Clone, Copy, Default)]
pub struct AiRunOutcome {
    pub run_id: i64,
    pub issues_inserted: usize,
}

fn norm_rule_from_checkpoint(checkpoint: &Checkpoint) -> NormRule {
    let review_type = checkpoint
        .rule_config
        .get("review_type")
        .and_then(|v| v.as_str())
        .map(|s| if s.eq_ignore_ascii_case("FORM") { ReviewType::Form } else { ReviewType::Tech })
        .unwrap_or(ReviewType::Tech);

    let mut rule = NormRule::new(&checkpoint.code, &checkpoint.name, review_type);
    if let Some(mode) = checkpoint.rule_config.get("compare_mode").and_then(|v| v.as_str()) {
        rule = rule.with_compare_mode(mode);
    }
    rule
}

/// Creates a fresh AI review run and executes it immediately. Most callers
/// use this; `terra-worker`'s queue instead picks up a run `terra-pipeline`'s
/// finalize stage already created and calls [`execute_ai_review_run`]
/// directly so the run id it enqueued is the one that actually gets used.
pub async fn run_ai_review(
    conn: &Connection,
    writer: &BatchWriter,
    version_id: VersionId,
    client: Arc<dyn ModelClient>,
    config: &AiConfig,
) -> ReviewResult<AiRunOutcome> {
    let run_id = queries::create_review_run(conn, version_id, EngineType::Ai)?;
    execute_ai_review_run(conn, writer, version_id, run_id, client, config).await
}

/// Runs the AI engine against an already-created `review_run` row (spec
/// §4.1 stage 7 hands one of these to the worker's queue instead of
/// running it inline).
pub async fn execute_ai_review_run(
    conn: &Connection,
    writer: &BatchWriter,
    version_id: VersionId,
    run_id: RunId,
    client: Arc<dyn ModelClient>,
    config: &AiConfig,
) -> ReviewResult<AiRunOutcome> {
    queries::update_run_status(conn, run_id, RunStatus::Running, true, false, None)?;

    let blocks = queries::load_blocks(conn, version_id)?;
    let anchors = queries::load_page_anchors(conn, version_id)?;
    let checkpoints = queries::load_enabled_checkpoints(conn, EngineType::Ai)?;
    let norm_library: Vec<NormRule> = checkpoints.iter().map(norm_rule_from_checkpoint).collect();

    if norm_library.is_empty() {
        queries::update_run_status(conn, run_id, RunStatus::Succeeded, false, true, None)?;
        return Ok(AiRunOutcome { run_id: run_id.get(), issues_inserted: 0 });
    }

    let doc_blocks: Vec<DocBlock> = blocks
        .iter()
        .filter(|b| matches!(b.block_type, BlockType::Para | BlockType::Heading))
        .map(|b| DocBlock {
            block_id: b.id,
            page_no: anchors.get(&b.id.get()).and_then(|a| a.page_no),
            text: b.text.clone(),
        })
        .collect();

    let driver = AiDriver::new(client, config);
    let drafts = driver.run(&doc_blocks, &norm_library).await;

    let outcome = insert_issues(conn, writer, version_id, run_id, None, drafts);
    match &outcome {
        Ok(count) => {
            queries::update_run_status(conn, run_id, RunStatus::Succeeded, false, true, None)?;
            info!(version_id = version_id.get(), run_id = run_id.get(), issues = count, "AI review run complete");
        }
        Err(err) => {
            let message: String = err.to_string().chars().take(2_000).collect();
            queries::update_run_status(conn, run_id, RunStatus::Failed, false, true, Some(&message))?;
        }
    }
    outcome.map(|issues_inserted| AiRunOutcome { run_id: run_id.get(), issues_inserted })
}
