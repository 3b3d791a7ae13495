//! Issue insertion (spec §4.8): resolves a missing page-no from the
//! anchor of the issue's first evidence block, defaulting to page 1
//! only as a last resort.

use chrono::Utc;
use rusqlite::Connection;
use terra_core::ids::{RunId, VersionId};
use terra_core::model::{Issue, IssueDraft};
use terra_store::{queries, BatchWriter, Row};

use crate::error::ReviewResult;

/// Inserts every draft for one run, returning the number of rows
/// written. Ids are allocated up front from a single `next_id` call and
/// incremented in-process, matching the parse stage's row-id pattern —
/// safe here because, like parsing, issue insertion for one run is
/// single-threaded against the store.
pub fn insert_issues(
    conn: &Connection,
    writer: &BatchWriter,
    version_id: VersionId,
    run_id: RunId,
    checkpoint_code: Option<&str>,
    drafts: Vec<IssueDraft>,
) -> ReviewResult<usize> {
    if drafts.is_empty() {
        return Ok(0);
    }

    let anchors = queries::load_page_anchors(conn, version_id)?;
    let mut next_id = queries::next_id(conn, "review_issue")?;
    let created_at = Utc::now().to_rfc3339();
    let mut count = 0usize;

    for draft in drafts {
        let id = next_id;
        next_id += 1;

        let page_no = draft
            .page_no
            .or_else(|| draft.evidence_block_ids.first().and_then(|b| anchors.get(&b.get())).and_then(|a| a.page_no))
            .unwrap_or(Issue::DEFAULT_PAGE_NO);

        let evidence_block_ids_json =
            serde_json::to_string(&draft.evidence_block_ids.iter().map(|b| b.get()).collect::<Vec<_>>())
                .unwrap_or_else(|_| "[]".to_string());
        let evidence_quotes_json = serde_json::to_string(&draft.evidence_quotes).unwrap_or_else(|_| "[]".to_string());

        writer.send(Row::Issue {
            id,
            version_id: version_id.get(),
            run_id: run_id.get(),
            checkpoint_code: checkpoint_code.map(str::to_string),
            issue_type: draft.issue_type,
            review_type: format!("{:?}", draft.review_type).to_uppercase(),
            severity: format!("{:?}", draft.severity).to_uppercase(),
            title: draft.title,
            description: draft.description,
            suggestion: draft.suggestion,
            confidence: draft.confidence,
            page_no: Some(page_no as i64),
            evidence_block_ids_json,
            evidence_quotes_json,
            created_at: created_at.clone(),
        })?;
        count += 1;
    }

    writer.flush_sync()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_core::ids::BlockId;
    use terra_core::model::{ReviewType, Severity};
    use terra_store::DatabaseManager;

    fn seed(conn: &Connection) -> (VersionId, BlockId) {
        conn.execute("INSERT INTO project (id, name) VALUES (1, 'p')", []).unwrap();
        conn.execute("INSERT INTO document (id, project_id, title) VALUES (1, 1, 'd')", []).unwrap();
        conn.execute(
            "INSERT INTO document_version (id, document_id, version_no, status, source_object_key, created_at, updated_at) \
             VALUES (1, 1, 1, 'READY', 'k', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO doc_block (id, version_id, block_type, order_index, text) VALUES (1, 1, 'PARA', 0, 'hello')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO block_page_anchor (block_id, page_no, confidence) VALUES (1, 7, 0.9)",
            [],
        )
        .unwrap();
        (VersionId(1), BlockId(1))
    }

    fn base_draft(evidence: Vec<BlockId>, page_no: Option<u32>) -> IssueDraft {
        IssueDraft {
            issue_type: "CONSISTENCY_VALUE_MISMATCH".into(),
            review_type: ReviewType::Tech,
            severity: Severity::High,
            title: "t".into(),
            description: "d".into(),
            suggestion: None,
            confidence: 0.8,
            evidence_block_ids: evidence,
            page_no,
            evidence_quotes: Vec::new(),
        }
    }

    #[test]
    fn page_no_resolves_from_evidence_block_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let db = DatabaseManager::open(path.to_str().unwrap(), 1, 1).unwrap();
        let conn = db.open_direct().unwrap();
        let (version_id, block_id) = seed(&conn);
        let run_id = queries::create_review_run(&conn, version_id, terra_core::model::EngineType::Rule).unwrap();

        let drafts = vec![base_draft(vec![block_id], None)];
        let count = insert_issues(&conn, db.writer(), version_id, run_id, Some("consistency"), drafts).unwrap();
        assert_eq!(count, 1);

        let page_no: Option<i64> = conn
            .query_row("SELECT page_no FROM review_issue WHERE run_id = ?1", [run_id.get()], |row| row.get(0))
            .unwrap();
        assert_eq!(page_no, Some(7));
    }

    #[test]
    fn page_no_defaults_when_no_anchor_and_no_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let db = DatabaseManager::open(path.to_str().unwrap(), 1, 1).unwrap();
        let conn = db.open_direct().unwrap();
        let (version_id, _block_id) = seed(&conn);
        let run_id = queries::create_review_run(&conn, version_id, terra_core::model::EngineType::Rule).unwrap();

        let drafts = vec![base_draft(Vec::new(), None)];
        insert_issues(&conn, db.writer(), version_id, run_id, Some("consistency"), drafts).unwrap();

        let page_no: Option<i64> = conn
            .query_row("SELECT page_no FROM review_issue WHERE run_id = ?1", [run_id.get()], |row| row.get(0))
            .unwrap();
        assert_eq!(page_no, Some(Issue::DEFAULT_PAGE_NO as i64));
    }

    #[test]
    fn explicit_draft_page_no_wins_over_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let db = DatabaseManager::open(path.to_str().unwrap(), 1, 1).unwrap();
        let conn = db.open_direct().unwrap();
        let (version_id, block_id) = seed(&conn);
        let run_id = queries::create_review_run(&conn, version_id, terra_core::model::EngineType::Rule).unwrap();

        let drafts = vec![base_draft(vec![block_id], Some(42))];
        insert_issues(&conn, db.writer(), version_id, run_id, None, drafts).unwrap();

        let page_no: Option<i64> = conn
            .query_row("SELECT page_no FROM review_issue WHERE run_id = ?1", [run_id.get()], |row| row.get(0))
            .unwrap();
        assert_eq!(page_no, Some(42));
    }
}
