//! RULE-engine review run (spec §4.5, §4.6): builds the `ReviewContext`
//! once, dispatches every enabled RULE checkpoint through the registry
//! `terra-rules` ships, and inserts the resulting issue drafts.

use std::collections::HashMap;

use rusqlite::Connection;
use terra_checkpoints::{build_context, run_checkpoints, Executor};
use terra_core::ids::VersionId;
use terra_core::model::{EngineType, RunStatus};
use terra_store::{queries, BatchWriter};
use tracing::info;

use crate::error::ReviewResult;
use crate::insertion::insert_issues;

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleRunOutcome {
    pub run_id: i64,
    pub issues_inserted: usize,
}

pub fn run_rule_review(conn: &Connection, writer: &BatchWriter, version_id: VersionId) -> ReviewResult<RuleRunOutcome> {
    let run_id = queries::create_review_run(conn, version_id, EngineType::Rule)?;
    queries::update_run_status(conn, run_id, RunStatus::Running, true, false, None)?;

    let result = dispatch(conn, writer, version_id, run_id);
    match &result {
        Ok(outcome) => {
            queries::update_run_status(conn, run_id, RunStatus::Succeeded, false, true, None)?;
            info!(version_id = version_id.get(), run_id = run_id.get(), issues = outcome.issues_inserted, "RULE review run complete");
        }
        Err(err) => {
            let message: String = err.to_string().chars().take(2_000).collect();
            queries::update_run_status(conn, run_id, RunStatus::Failed, false, true, Some(&message))?;
        }
    }
    result
}

fn dispatch(conn: &Connection, writer: &BatchWriter, version_id: VersionId, run_id: terra_core::ids::RunId) -> ReviewResult<RuleRunOutcome> {
    let context = build_context(conn, version_id)?;
    let registry: HashMap<&'static str, Executor> = terra_rules::all_executors().into_iter().collect();

    let drafts = run_checkpoints(conn, &context, EngineType::Rule, &registry)?;
    let mut issues_inserted = 0;
    for (checkpoint_code, group) in group_by_checkpoint(drafts) {
        issues_inserted += insert_issues(conn, writer, version_id, run_id, Some(&checkpoint_code), group)?;
    }
    Ok(RuleRunOutcome { run_id: run_id.get(), issues_inserted })
}

/// Groups `(draft, checkpoint_code)` pairs by checkpoint while keeping
/// each group's drafts in the order the executor produced them.
fn group_by_checkpoint(
    pairs: Vec<(terra_core::model::IssueDraft, String)>,
) -> Vec<(String, Vec<terra_core::model::IssueDraft>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<terra_core::model::IssueDraft>> = HashMap::new();
    for (draft, code) in pairs {
        if !groups.contains_key(&code) {
            order.push(code.clone());
        }
        groups.entry(code).or_default().push(draft);
    }
    order.into_iter().map(|code| { let drafts = groups.remove(&code).unwrap(); (code, drafts) }).collect()
}
