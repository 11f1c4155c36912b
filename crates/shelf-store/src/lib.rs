//! File-backed JSON collections for Shelf.
//!
//! A [`Collection`] owns one JSON document holding an ordered list of records.
//! The document is loaded whole into a cached snapshot and rewritten whole on
//! every mutation.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`FileDocumentStore`] -- `<dir>/<name>.json`, written via temp file + rename
//! - [`InMemoryDocumentStore`] -- holds the serialized document in memory, for tests
//!
//! # Design Rules
//!
//! 1. Reads go through the cache; a snapshot older than the caching window is
//!    re-read from storage first.
//! 2. Writes bypass the cache: they re-read storage, apply the change, and
//!    persist the whole document while holding the collection's write lock.
//! 3. The cache is replaced only after a successful write, never with a
//!    partially-applied document.
//! 4. Argument errors are raised before any I/O.
//! 5. A document that fails to parse is an error, never an empty collection.
//! 6. There is no cross-process coordination. Two processes writing one
//!    storage root are last-writer-wins at the file level.

mod cache;
pub mod collection;
pub mod error;
pub mod file;
pub mod memory;
pub mod schema;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use collection::{Collection, CollectionOptions, DEFAULT_CACHING_TIME};
pub use error::{StoreError, StoreResult};
pub use file::FileDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use schema::CollectionSchema;
pub use traits::DocumentStore;
