use thiserror::Error;

/// One error enum for every stage boundary, matching the teacher's
/// one-error-type-per-crate convention. The driver is responsible for
/// truncating `Display` output to the version's 2,000-char error-message
/// column; this type itself carries the untruncated detail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("convert stage: {0}")]
    Convert(String),

    #[error("parse structure stage: {0}")]
    ParseStructure(String),

    #[error("layout extraction stage: {0}")]
    Layout(String),

    #[error("align stage: {0}")]
    Align(String),

    #[error("finalize stage: {0}")]
    Finalize(String),

    #[error("object store: {0}")]
    ObjectStore(#[from] terra_objectstore::ObjectStoreError),

    #[error("store: {0}")]
    Store(#[from] terra_store::StoreError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("version {0} already has an in-flight pipeline")]
    AlreadyRunning(i64),

    #[error("pipeline canceled at stage boundary")]
    Canceled,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
