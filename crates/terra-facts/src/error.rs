use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactError {
    #[error("invalid fact pattern: {0}")]
    InvalidPattern(String),
}

pub type FactResult<T> = Result<T, FactError>;
