use std::path::Path;

use shelf_types::Document;

use crate::error::StoreResult;

/// Persistent home of one collection's document.
///
/// All implementations must satisfy these invariants:
/// - After [`ensure`](DocumentStore::ensure), a [`load`](DocumentStore::load)
///   succeeds and returns an empty document if nothing was ever saved.
/// - [`save`](DocumentStore::save) is all-or-nothing: a concurrent or later
///   `load` sees either the previous document or the new one.
/// - Content that does not parse is reported, never replaced by an empty
///   document.
/// - All I/O errors are propagated, never silently ignored.
///
/// Implementations do no locking of their own; [`Collection`](crate::Collection)
/// serializes access.
pub trait DocumentStore: Send + Sync {
    /// Create the backing storage if it does not exist yet.
    fn ensure(&self) -> StoreResult<()>;

    /// Read and decode the full document.
    fn load(&self) -> StoreResult<Document>;

    /// Replace the full document.
    fn save(&self, document: &Document) -> StoreResult<()>;

    /// Delete all backing storage and recreate it holding an empty document.
    fn purge(&self) -> StoreResult<()>;

    /// Delete all backing storage. The store is unusable until `ensure`.
    fn destroy(&self) -> StoreResult<()>;

    /// The document file, for file-backed stores.
    fn location(&self) -> Option<&Path> {
        None
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn ensure(&self) -> StoreResult<()> {
        (**self).ensure()
    }

    fn load(&self) -> StoreResult<Document> {
        (**self).load()
    }

    fn save(&self, document: &Document) -> StoreResult<()> {
        (**self).save(document)
    }

    fn purge(&self) -> StoreResult<()> {
        (**self).purge()
    }

    fn destroy(&self) -> StoreResult<()> {
        (**self).destroy()
    }

    fn location(&self) -> Option<&Path> {
        (**self).location()
    }
}
