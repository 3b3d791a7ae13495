use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("backend not configured: {0}")]
    Unconfigured(&'static str),

    #[error("backend not implemented: {0}")]
    UnsupportedBackend(&'static str),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;
