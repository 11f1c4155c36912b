use shelf_types::TypeError;

/// Errors from collection and document operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An identifier, record, or patch has the wrong shape. Raised before any
    /// I/O, with no state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The document file exists but does not parse.
    #[error("corrupt document {path}: {reason}")]
    CorruptDocument { path: String, reason: String },

    /// Serialization failure while encoding a document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the collection lock.
    #[error("collection lock poisoned")]
    LockPoisoned,
}

impl From<TypeError> for StoreError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::NotAnObject(_) | TypeError::InvalidId(_) => Self::InvalidArgument(e.to_string()),
            TypeError::Serialization(reason) => Self::Serialization(reason),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
