//! AI review run queue: polls `review_run` rows `terra-pipeline`'s finalize
//! stage left `PENDING` and executes each through `terra-ai`.

use std::sync::Arc;
use std::time::Duration;

use terra_ai::ModelClient;
use terra_core::config::AiConfig;
use terra_core::model::EngineType;
use terra_review::execute_ai_review_run;
use terra_store::{queries, DatabaseManager};
use tracing::{error, info};

use crate::error::WorkerResult;

pub struct ReviewQueue {
    db: Arc<DatabaseManager>,
    client: Arc<dyn ModelClient>,
    ai_config: AiConfig,
    poll_interval: Duration,
}

impl ReviewQueue {
    pub fn new(db: Arc<DatabaseManager>, client: Arc<dyn ModelClient>, ai_config: AiConfig, poll_interval: Duration) -> Self {
        Self { db, client, ai_config, poll_interval }
    }

    /// Polls forever until the process is killed; each tick's failures are
    /// logged and don't stop the loop, matching the driver's policy of
    /// never letting one run's failure take down the others.
    pub async fn run_forever(&self) {
        loop {
            match self.drain_once().await {
                Ok(0) => {}
                Ok(n) => info!(runs = n, "review queue drained"),
                Err(err) => error!(%err, "review queue poll failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Runs every currently-pending AI review run once, returning how many
    /// were processed (successfully or not).
    pub async fn drain_once(&self) -> WorkerResult<usize> {
        let pending = self.db.with_reader(|conn| queries::load_pending_review_runs(conn, EngineType::Ai))?;
        let mut processed = 0usize;

        for (run_id, version_id) in pending {
            let conn = self.db.open_direct()?;
            let outcome =
                execute_ai_review_run(&conn, self.db.writer(), version_id, run_id, self.client.clone(), &self.ai_config).await;
            match outcome {
                Ok(outcome) => info!(run_id = outcome.run_id, issues = outcome.issues_inserted, "AI review run complete"),
                Err(err) => error!(run_id = run_id.get(), %err, "AI review run failed"),
            }
            processed += 1;
        }
        Ok(processed)
    }
}
