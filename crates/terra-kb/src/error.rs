use thiserror::Error;

#[derive(Debug, Error)]
pub enum KbError {
    #[error("store: {0}")]
    Store(#[from] terra_store::StoreError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type KbResult<T> = Result<T, KbError>;
