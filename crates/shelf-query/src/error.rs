//! Error types for query operations.

use thiserror::Error;

/// Errors that can occur while building or running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A pattern failed to compile as a regular expression.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Pagination was requested with an unusable page size.
    #[error("pagination error: {0}")]
    Page(#[from] shelf_page::PageError),
}

/// Result alias for query operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;
