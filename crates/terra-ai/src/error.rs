use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model response was not valid JSON: {0}")]
    Parse(String),

    #[error("model response missing expected key: {0}")]
    MissingKey(&'static str),
}

pub type AiResult<T> = Result<T, AiError>;
