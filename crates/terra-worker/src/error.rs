use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store: {0}")]
    Store(#[from] terra_store::StoreError),

    #[error("object store: {0}")]
    ObjectStore(#[from] terra_objectstore::ObjectStoreError),

    #[error("pipeline: {0}")]
    Pipeline(#[from] terra_pipeline::PipelineError),

    #[error("review: {0}")]
    Review(#[from] terra_review::ReviewError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("ingest task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
