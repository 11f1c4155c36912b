//! Error types for registry operations.

use shelf_store::StoreError;
use thiserror::Error;

/// Errors that can occur while configuring or using the registry.
#[derive(Debug, Error)]
pub enum DbError {
    /// The collection name does not match `^[A-Za-z_][A-Za-z0-9_]*$`.
    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName { name: String, reason: String },

    /// A configuration value is out of range or points at nothing.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The schema mapping file could not be read or parsed.
    #[error("invalid schema {path}: {reason}")]
    Schema { path: String, reason: String },

    /// A collection operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error while managing the storage root.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding a registry lock.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for registry operations.
pub type DbResult<T> = std::result::Result<T, DbError>;
