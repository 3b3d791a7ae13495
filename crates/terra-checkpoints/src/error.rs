use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Store(#[from] terra_store::StoreError),
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;
