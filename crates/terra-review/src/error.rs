use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("store: {0}")]
    Store(#[from] terra_store::StoreError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("checkpoint: {0}")]
    Checkpoint(#[from] terra_checkpoints::CheckpointError),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
