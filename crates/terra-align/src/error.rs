use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("no pages to align against")]
    NoPages,
}

pub type AlignResult<T> = Result<T, AlignError>;
