//! Pipeline driver: runs the seven stages of spec §4.1 in sequence for
//! one version, persisting `(status, progress, current_step)` after each
//! and rejecting a second concurrent run for the same version.

use std::collections::HashSet;
use std::io::Read as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use terra_core::config::ParseConfig;
use terra_core::ids::VersionId;
use terra_core::model::VersionStatus;
use terra_objectstore::{version_source_key, ObjectStore};
use terra_store::{queries, DatabaseManager};
use tracing::{error, info};

use crate::align_stage;
use crate::convert::DocumentConverter;
use crate::error::{PipelineError, PipelineResult};
use crate::facts_stage;
use crate::finalize;
use crate::layout::LayoutExtractor;
use crate::parse;
use crate::self_index;
use crate::stage::StageOutcome;

const ERROR_MESSAGE_MAX: usize = 2_000;

pub struct PipelineCx {
    pub db: Arc<DatabaseManager>,
    pub object_store: Arc<dyn ObjectStore>,
    pub converter: Arc<dyn DocumentConverter>,
    pub layout_extractor: Arc<dyn LayoutExtractor>,
    pub parse_cfg: ParseConfig,
    pub auto_index_self: bool,
    pub auto_review_on_ready: bool,
    in_flight: Mutex<HashSet<i64>>,
}

impl PipelineCx {
    pub fn new(
        db: Arc<DatabaseManager>,
        object_store: Arc<dyn ObjectStore>,
        converter: Arc<dyn DocumentConverter>,
        layout_extractor: Arc<dyn LayoutExtractor>,
        parse_cfg: ParseConfig,
        auto_index_self: bool,
        auto_review_on_ready: bool,
    ) -> Self {
        Self {
            db,
            object_store,
            converter,
            layout_extractor,
            parse_cfg,
            auto_index_self,
            auto_review_on_ready,
            in_flight: Mutex::new(HashSet::new()),
        }
    }
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<i64>>,
    version_id: i64,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<i64>>, version_id: i64) -> PipelineResult<Self> {
        let mut guard = set.lock().expect("in-flight mutex poisoned");
        if !guard.insert(version_id) {
            return Err(PipelineError::AlreadyRunning(version_id));
        }
        Ok(Self { set, version_id })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().expect("in-flight mutex poisoned").remove(&self.version_id);
    }
}

fn truncated(err: &PipelineError) -> String {
    err.to_string().chars().take(ERROR_MESSAGE_MAX).collect()
}

fn fail_version(db: &DatabaseManager, version_id: VersionId, err: &PipelineError) -> PipelineResult<()> {
    error!(version_id = version_id.get(), %err, "pipeline stage failed, marking version FAILED");
    let conn = db.open_direct()?;
    queries::update_version_status(
        &conn,
        version_id,
        VersionStatus::Failed,
        0,
        Some("failed"),
        Some(&truncated(err)),
    )?;
    Ok(())
}

fn set_status(db: &DatabaseManager, version_id: VersionId, outcome: &StageOutcome) -> PipelineResult<()> {
    if let Some(status) = outcome.status {
        let conn = db.open_direct()?;
        queries::update_version_status(&conn, version_id, status, status.progress_floor(), Some(outcome.current_step), None)?;
    }
    Ok(())
}

/// Runs every stage for `version_id` in order. Returns `Err` only for a
/// hard (non-soft) stage failure or if a run is already in flight for
/// this version; the version's own status row is always left consistent
/// with how far the pipeline got.
pub fn run_pipeline(cx: &PipelineCx, version_id: VersionId) -> PipelineResult<()> {
    let _guard = InFlightGuard::acquire(&cx.in_flight, version_id.get())?;

    let result = run_stages(cx, version_id);
    if let Err(err) = &result {
        if !matches!(err, PipelineError::AlreadyRunning(_)) {
            fail_version(&cx.db, version_id, err)?;
        }
    }
    result
}

fn run_stages(cx: &PipelineCx, version_id: VersionId) -> PipelineResult<()> {
    let version = {
        let conn = cx.db.open_direct()?;
        queries::load_version(&conn, version_id)?
            .ok_or_else(|| PipelineError::ParseStructure(format!("version {} not found", version_id.get())))?
    };

    // Stage 1: convert.
    set_status(&cx.db, version_id, &StageOutcome::new(VersionStatus::Converting, "convert"))?;
    let source_bytes = read_source(cx, &version.source_object_key)?;
    let work_dir = std::env::temp_dir().join(format!("terra-pipeline-v{}", version_id.get()));
    let source_path = work_dir.join("source.docx");
    std::fs::create_dir_all(&work_dir).map_err(|e| PipelineError::Convert(e.to_string()))?;
    std::fs::write(&source_path, &source_bytes).map_err(|e| PipelineError::Convert(e.to_string()))?;

    let pdf_bytes = cx.converter.convert(
        &source_path,
        &work_dir,
        Duration::from_secs(cx.parse_cfg.convert_timeout_secs),
    )?;
    {
        let conn = cx.db.open_direct()?;
        let project_id = queries::project_id_for_document(&conn, version.document_id)?;
        let pdf_key = version_source_key(project_id, version.document_id.get(), version_id.get(), "preview.pdf");
        cx.object_store.put(&pdf_key, &pdf_bytes)?;
        queries::set_pdf_object_key(&conn, version_id, &pdf_key)?;
    }

    // Stage 2: parse structure.
    set_status(&cx.db, version_id, &StageOutcome::new(VersionStatus::Parsing, "parse"))?;
    {
        let conn = cx.db.open_direct()?;
        let outcome = parse::run(&conn, cx.db.writer(), version_id, &source_bytes, &cx.parse_cfg)?;
        info!(version_id = version_id.get(), outline = outcome.outline_count, blocks = outcome.block_count, tables = outcome.table_count, "parsed structure");
    }

    // Stage 3: layout extraction. An extraction failure degrades to zero
    // pages rather than aborting — the aligner treats that exactly like a
    // version with no PDF artifact, anchoring every block unresolved
    // instead of failing stage 4 outright.
    let pages = cx.layout_extractor.extract(&pdf_bytes, &work_dir).unwrap_or_else(|err| {
        error!(version_id = version_id.get(), %err, "layout extraction failed, aligning with zero pages");
        Vec::new()
    });

    // Stage 4: align.
    set_status(&cx.db, version_id, &StageOutcome::new(VersionStatus::Aligning, "align"))?;
    {
        let conn = cx.db.open_direct()?;
        let outcome = align_stage::run(&conn, cx.db.writer(), version_id, &pages)?;
        info!(version_id = version_id.get(), anchored = outcome.anchored, total = outcome.total, "aligned blocks to pages");
    }

    // Stage 5: fact extraction — soft-failing.
    set_status(&cx.db, version_id, &StageOutcome::new(VersionStatus::ExtractingFacts, "extract_facts"))?;
    {
        let conn = cx.db.open_direct()?;
        match facts_stage::run(&conn, cx.db.writer(), version_id) {
            Ok(outcome) => info!(version_id = version_id.get(), facts = outcome.fact_count, "extracted facts"),
            Err(err) => error!(version_id = version_id.get(), %err, "fact extraction failed, continuing with 0 facts"),
        }
    }

    // Stage 6: self-index.
    {
        let conn = cx.db.open_direct()?;
        match self_index::run(&conn, cx.db.writer(), version_id, cx.auto_index_self) {
            Ok(outcome) if !outcome.skipped => info!(version_id = version_id.get(), chunks = outcome.chunk_count, "self-indexed version"),
            Ok(_) => {}
            Err(err) => error!(version_id = version_id.get(), %err, "self-indexing failed, continuing"),
        }
    }

    // Stage 7: finalize.
    let finalize_outcome = {
        let conn = cx.db.open_direct()?;
        finalize::run(&conn, version_id, cx.auto_review_on_ready)?
    };
    {
        let conn = cx.db.open_direct()?;
        queries::update_version_status(&conn, version_id, VersionStatus::Ready, 100, Some("ready"), None)?;
    }
    if let Some(run_id) = finalize_outcome.enqueued_run_id {
        info!(version_id = version_id.get(), run_id, "enqueued AI review run on ready");
    }

    Ok(())
}

fn read_source(cx: &PipelineCx, key: &str) -> PipelineResult<Vec<u8>> {
    let mut reader = cx
        .object_store
        .get_object(key)?
        .ok_or_else(|| PipelineError::Convert(format!("source object {key} not found")))?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| PipelineError::Convert(e.to_string()))?;
    Ok(bytes)
}
