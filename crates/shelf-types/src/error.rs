use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid record id: {0:?}")]
    InvalidId(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
