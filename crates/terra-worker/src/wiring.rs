//! Builds the concrete, production-shaped context (`drift-core`'s workspace
//! orchestrator style: one struct wiring every trait object together from
//! config) that the pool and queue dispatch against.

use std::sync::Arc;

use terra_ai::{HttpModelClient, ModelClient};
use terra_core::config::{AppConfig, StorageBackend};
use terra_objectstore::{LocalObjectStore, ObjectStore};
use terra_pipeline::convert::{DocumentConverter, LibreOfficeConverter};
use terra_pipeline::layout::{EmptyLayoutExtractor, LayoutExtractor, SidecarLayoutExtractor};
use terra_pipeline::PipelineCx;
use terra_store::DatabaseManager;

use crate::error::{WorkerError, WorkerResult};

pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<DatabaseManager>,
    pub pipeline_cx: Arc<PipelineCx>,
    pub model_client: Arc<dyn ModelClient>,
}

impl AppContext {
    pub fn build(config: AppConfig) -> WorkerResult<Self> {
        let db = Arc::new(DatabaseManager::open(
            &config.store.database_path,
            config.store.min_pool_size,
            config.store.max_pool_size,
        )?);

        let object_store: Arc<dyn ObjectStore> = match config.object_store.backend {
            StorageBackend::Local => Arc::new(LocalObjectStore::new(&config.object_store.local_root, "/objects")?),
            StorageBackend::Minio => {
                return Err(WorkerError::ObjectStore(terra_objectstore::ObjectStoreError::UnsupportedBackend(
                    "minio",
                )))
            }
        };

        let converter: Arc<dyn DocumentConverter> = Arc::new(LibreOfficeConverter::default());
        let layout_extractor: Arc<dyn LayoutExtractor> = if which_exists("terra-layout-extract") {
            Arc::new(SidecarLayoutExtractor { binary: "terra-layout-extract".to_string() })
        } else {
            Arc::new(EmptyLayoutExtractor)
        };

        let pipeline_cx = Arc::new(PipelineCx::new(
            db.clone(),
            object_store,
            converter,
            layout_extractor,
            config.parse,
            true,
            config.auto_trigger_review,
        ));

        let model_client: Arc<dyn ModelClient> = Arc::new(HttpModelClient::new(&config.ai));

        Ok(Self { config, db, pipeline_cx, model_client })
    }
}

/// The layout extractor is an opaque external tool (spec §4.1 stage 3);
/// when it isn't on `PATH` we degrade to zero pages rather than fail to
/// start, same as the driver's own unanchored fallback.
fn which_exists(binary: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}
