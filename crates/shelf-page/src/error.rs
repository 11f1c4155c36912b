use thiserror::Error;

/// Errors from pagination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    /// A page must hold at least one item.
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// Result alias for pagination.
pub type PageResult<T> = Result<T, PageError>;
