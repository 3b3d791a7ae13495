use thiserror::Error;

/// Errors shared across crate boundaries that don't warrant their own
/// crate-local error type (e.g. truncation/validation helpers living here).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("value out of range: {0}")]
    OutOfRange(String),
}
