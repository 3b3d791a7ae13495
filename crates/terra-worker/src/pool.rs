//! Bounded ingest worker pool: one `tokio` task per version, capped by a
//! semaphore, wrapping the synchronous `terra_pipeline::run_pipeline` in
//! `spawn_blocking` since conversion/layout extraction shell out and block.

use std::sync::Arc;

use terra_core::ids::VersionId;
use terra_pipeline::{run_pipeline, PipelineCx};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::WorkerResult;

pub struct IngestPool {
    cx: Arc<PipelineCx>,
    semaphore: Arc<Semaphore>,
}

impl IngestPool {
    pub fn new(cx: Arc<PipelineCx>, capacity: usize) -> Self {
        Self { cx, semaphore: Arc::new(Semaphore::new(capacity.max(1))) }
    }

    /// Runs the pipeline for `version_id`, blocking the caller until it
    /// finishes (or a permit frees up). Spawn this from a loop that doesn't
    /// need the result to get true fire-and-forget dispatch.
    pub async fn dispatch(&self, version_id: VersionId) -> WorkerResult<()> {
        let permit = self.semaphore.clone().acquire_owned().await.expect("ingest semaphore closed");
        let cx = self.cx.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_pipeline(&cx, version_id)
        })
        .await?;

        match result {
            Ok(()) => {
                info!(version_id = version_id.get(), "ingest pipeline finished");
                Ok(())
            }
            Err(err) => {
                error!(version_id = version_id.get(), %err, "ingest pipeline failed");
                Err(err.into())
            }
        }
    }
}
