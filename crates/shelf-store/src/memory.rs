use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use shelf_types::{Document, TypeError};

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;

/// In-memory document store.
///
/// Intended for tests and embedding. The document is kept in its serialized
/// form so loads exercise the same decoding path as the file store, and raw
/// (even corrupt) contents can be injected with [`set_raw`](Self::set_raw).
pub struct InMemoryDocumentStore {
    /// `None` until `ensure`, and again after `destroy`.
    text: RwLock<Option<String>>,
    read_only: AtomicBool,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            text: RwLock::new(Some(String::new())),
            read_only: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    /// Replace the stored text verbatim, bypassing encoding.
    pub fn set_raw(&self, text: impl Into<String>) -> StoreResult<()> {
        let mut slot = self.text.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = Some(text.into());
        Ok(())
    }

    /// The stored text, if the store exists.
    pub fn raw(&self) -> StoreResult<Option<String>> {
        let slot = self.text.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(slot.clone())
    }

    /// Make every subsequent save fail with a permission error.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn ensure(&self) -> StoreResult<()> {
        let mut slot = self.text.write().map_err(|_| StoreError::LockPoisoned)?;
        slot.get_or_insert_with(String::new);
        Ok(())
    }

    fn load(&self) -> StoreResult<Document> {
        let slot = self.text.read().map_err(|_| StoreError::LockPoisoned)?;
        let document = match slot.as_deref() {
            None => Document::empty(),
            Some(text) => Document::from_json(text).map_err(|e| StoreError::CorruptDocument {
                path: "<memory>".into(),
                reason: match e {
                    TypeError::Serialization(reason) => reason,
                    other => other.to_string(),
                },
            })?,
        };
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(document)
    }

    fn save(&self, document: &Document) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "store is read-only",
            )));
        }
        let json = document.to_json()?;
        let mut slot = self.text.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn purge(&self) -> StoreResult<()> {
        let mut slot = self.text.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = Some(String::new());
        Ok(())
    }

    fn destroy(&self) -> StoreResult<()> {
        let mut slot = self.text.write().map_err(|_| StoreError::LockPoisoned)?;
        *slot = None;
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("loads", &self.load_count())
            .field("saves", &self.save_count())
            .finish()
    }
}
