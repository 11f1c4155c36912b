use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;
use shelf_query::{Finder, Projection};
use shelf_types::{into_record, record_id, Document, Record, RecordId, Timestamp, ID_FIELD, TS_FIELD};
use tracing::{debug, warn};

use crate::cache::CacheState;
use crate::error::{StoreError, StoreResult};
use crate::file::FileDocumentStore;
use crate::schema::CollectionSchema;
use crate::traits::DocumentStore;

/// How long a read snapshot is served before storage is consulted again.
pub const DEFAULT_CACHING_TIME: Duration = Duration::from_secs(5 * 60);

/// Per-collection settings.
#[derive(Clone, Debug)]
pub struct CollectionOptions {
    /// Staleness window of the read cache. Zero re-reads on every call.
    pub caching_time: Duration,
    /// Fields records are expected to carry.
    pub schema: CollectionSchema,
}

impl CollectionOptions {
    pub fn with_caching_time(mut self, caching_time: Duration) -> Self {
        self.caching_time = caching_time;
        self
    }

    pub fn with_schema(mut self, schema: CollectionSchema) -> Self {
        self.schema = schema;
        self
    }
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            caching_time: DEFAULT_CACHING_TIME,
            schema: CollectionSchema::default(),
        }
    }
}

/// Result of a change applied to a freshly loaded document.
enum Change<T> {
    /// The document was modified and must be persisted.
    Write(T),
    /// Nothing to persist.
    Keep(T),
}

/// A named, persistent, ordered list of records.
///
/// Reads are served from a cached snapshot that is refreshed once it is older
/// than [`CollectionOptions::caching_time`]. Every mutation re-reads the
/// document from storage, applies the change, and rewrites the whole document
/// while holding the collection's write lock, then replaces the snapshot.
///
/// Records are newest-first: [`add`](Self::add) prepends.
pub struct Collection {
    name: String,
    store: Box<dyn DocumentStore>,
    options: CollectionOptions,
    state: RwLock<CacheState>,
}

impl Collection {
    /// Open the file-backed collection `name` stored in `dir`, creating the
    /// directory and an empty document if needed.
    pub fn open(name: &str, dir: &Path, options: CollectionOptions) -> StoreResult<Self> {
        let store = FileDocumentStore::open(dir, name)?;
        Ok(Self::from_parts(name, Box::new(store), options))
    }

    /// Build a collection over an arbitrary backend.
    pub fn with_store(
        name: &str,
        store: Box<dyn DocumentStore>,
        options: CollectionOptions,
    ) -> StoreResult<Self> {
        store.ensure()?;
        Ok(Self::from_parts(name, store, options))
    }

    fn from_parts(name: &str, store: Box<dyn DocumentStore>, options: CollectionOptions) -> Self {
        Self {
            name: name.to_string(),
            store,
            options,
            state: RwLock::new(CacheState::cold()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document file, for file-backed collections.
    pub fn file(&self) -> Option<&Path> {
        self.store.location()
    }

    /// The directory holding the document file.
    pub fn dir(&self) -> Option<&Path> {
        self.file().and_then(Path::parent)
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.options.schema
    }

    pub fn caching_time(&self) -> Duration {
        self.options.caching_time
    }

    /// Schema fields that `record` lacks.
    pub fn missing_fields<'a>(&'a self, record: &Record) -> Vec<&'a str> {
        self.options.schema.missing_fields(record)
    }

    /// Time of the last write seen by the cache.
    pub fn updated_at(&self) -> StoreResult<Timestamp> {
        self.snapshot()?;
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.updated_at())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The current snapshot, re-read from storage if stale.
    fn snapshot(&self) -> StoreResult<Arc<Vec<Record>>> {
        {
            let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
            if !state.is_stale(self.options.caching_time) {
                return Ok(state.snapshot());
            }
        }

        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        // Another reader may have refreshed while we waited.
        if state.is_stale(self.options.caching_time) {
            let document = self.load()?;
            debug!(collection = %self.name, entries = document.len(), "refreshed cache");
            state.fill(document);
        }
        Ok(state.snapshot())
    }

    /// Drop the cached snapshot and re-read storage now.
    pub fn refresh(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let document = self.load()?;
        debug!(collection = %self.name, entries = document.len(), "refreshed cache");
        state.fill(document);
        Ok(())
    }

    /// Every record, newest first.
    pub fn all(&self) -> StoreResult<Vec<Record>> {
        Ok(self.snapshot()?.as_ref().clone())
    }

    /// The first record whose `_id` is `id`, projected onto `fields`.
    pub fn get(&self, id: &str, fields: &Projection) -> StoreResult<Option<Record>> {
        let id = RecordId::parse(id)?;
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .iter()
            .find(|r| record_id(r) == Some(id.as_str()))
            .map(|r| fields.apply(r)))
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.snapshot()?.len())
    }

    /// A query over the current snapshot.
    pub fn find(&self) -> StoreResult<Finder> {
        Ok(Finder::from_snapshot(self.snapshot()?))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Store a new record and return its generated id.
    ///
    /// Any `_id` or `_ts` already present in `record` is overwritten.
    pub fn add(&self, record: Value) -> StoreResult<RecordId> {
        let mut record = into_record(record)?;
        let missing = self.missing_fields(&record);
        if !missing.is_empty() {
            warn!(collection = %self.name, ?missing, "record lacks schema fields");
        }

        let id = RecordId::generate();
        record.insert(ID_FIELD.into(), Value::String(id.to_string()));
        record.insert(TS_FIELD.into(), Value::from(Timestamp::now().as_millis()));

        self.mutate(|document| {
            document.entries.insert(0, record);
            Ok(Change::Write(()))
        })?;
        debug!(collection = %self.name, id = %id.short_id(), "added record");
        Ok(id)
    }

    /// Merge `patch` into the record `id` and return the result.
    ///
    /// Only keys the record already has are written; new keys are ignored.
    /// Objects merge key by key and arrays index by index, at any depth, and
    /// `_id` and `_ts` are never copied. Returns `None`, without writing, when
    /// no record has that id.
    pub fn update(&self, id: &str, patch: Value) -> StoreResult<Option<Record>> {
        let id = RecordId::parse(id)?;
        let patch = into_record(patch)?;

        let merged = self.mutate(|document| {
            let Some(entry) = document
                .entries
                .iter_mut()
                .find(|r| record_id(r) == Some(id.as_str()))
            else {
                return Ok(Change::Keep(None));
            };
            merge_object(entry, patch);
            Ok(Change::Write(Some(entry.clone())))
        })?;

        if merged.is_some() {
            debug!(collection = %self.name, id = %id, "updated record");
        }
        Ok(merged)
    }

    /// Delete the record `id` and return it.
    ///
    /// Scans from the end of the list, so with duplicated ids the last match
    /// is removed while [`get`](Self::get) returns the first.
    pub fn remove(&self, id: &str) -> StoreResult<Option<Record>> {
        let id = RecordId::parse(id)?;

        let removed = self.mutate(|document| {
            match document
                .entries
                .iter()
                .rposition(|r| record_id(r) == Some(id.as_str()))
            {
                Some(pos) => Ok(Change::Write(Some(document.entries.remove(pos)))),
                None => Ok(Change::Keep(None)),
            }
        })?;

        if removed.is_some() {
            debug!(collection = %self.name, id = %id, "removed record");
        }
        Ok(removed)
    }

    /// Replace all records with `entries` if they differ from what is stored.
    ///
    /// Every entry must carry a non-empty string `_id`, unique within
    /// `entries`. Returns whether a write happened.
    pub fn sync(&self, entries: Vec<Record>) -> StoreResult<bool> {
        check_unique_ids(&entries)?;

        let written = self.mutate(|document| {
            if document.entries == entries {
                return Ok(Change::Keep(false));
            }
            document.entries = entries;
            Ok(Change::Write(true))
        })?;
        debug!(collection = %self.name, written, "synced entries");
        Ok(written)
    }

    /// Delete the backing storage and recreate it empty.
    pub fn clear(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        self.store.purge()?;
        state.fill(Document::empty());
        debug!(collection = %self.name, "cleared collection");
        Ok(())
    }

    /// Delete the backing storage. Later reads see an empty collection until
    /// something is written again.
    pub fn destroy(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        self.store.destroy()?;
        state.invalidate();
        Ok(())
    }

    /// Load from storage under the write lock, apply `change`, and persist if
    /// it modified the document. The cache is replaced only after a
    /// successful write.
    fn mutate<T, F>(&self, change: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Document) -> StoreResult<Change<T>>,
    {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut document = self.load()?;

        let out = match change(&mut document)? {
            Change::Write(out) => {
                document.touch();
                self.store.save(&document)?;
                out
            }
            Change::Keep(out) => out,
        };
        state.fill(document);
        Ok(out)
    }

    fn load(&self) -> StoreResult<Document> {
        let document = self.store.load()?;
        let mut seen = HashSet::with_capacity(document.len());
        for id in document.entries.iter().filter_map(record_id) {
            if !seen.insert(id) {
                warn!(collection = %self.name, id, "duplicate record id in document");
            }
        }
        Ok(document)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("file", &self.file())
            .field("caching_time", &self.options.caching_time)
            .finish()
    }
}

/// Every entry has a non-empty string `_id`, and no two share one.
fn check_unique_ids(entries: &[Record]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match record_id(entry) {
            Some(id) if !id.is_empty() => {
                if !seen.insert(id) {
                    return Err(StoreError::InvalidArgument(format!(
                        "duplicate record id {id:?} at entry {index}"
                    )));
                }
            }
            _ => {
                return Err(StoreError::InvalidArgument(format!(
                    "entry {index} has no string {ID_FIELD}"
                )))
            }
        }
    }
    Ok(())
}

/// Copy the keys of `patch` that `target` already has, skipping `_id` and
/// `_ts`.
fn merge_object(target: &mut Record, patch: Record) {
    for (key, value) in patch {
        if key == ID_FIELD || key == TS_FIELD {
            continue;
        }
        if let Some(slot) = target.get_mut(&key) {
            merge_into(slot, value);
        }
    }
}

/// Objects and arrays merge into their existing counterpart; anything else
/// replaces the slot.
fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => merge_object(existing, incoming),
        (Value::Array(existing), Value::Array(incoming)) => {
            for (slot, value) in existing.iter_mut().zip(incoming) {
                merge_into(slot, value);
            }
        }
        (slot, value) => *slot = value,
    }
}
