use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use shelf_types::{Document, TypeError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;

/// Extension of document files.
pub const DOCUMENT_EXT: &str = "json";

/// A document kept as `<dir>/<name>.json`.
///
/// Saves write the new contents to a temporary file in the same directory and
/// rename it over the document, so readers never see a half-written file.
/// The directory belongs to this store: [`purge`](DocumentStore::purge) and
/// [`destroy`](DocumentStore::destroy) remove it with everything inside.
#[derive(Debug)]
pub struct FileDocumentStore {
    dir: PathBuf,
    path: PathBuf,
}

impl FileDocumentStore {
    /// Describe the document for collection `name` inside `dir`. No I/O.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            path: dir.join(format!("{name}.{DOCUMENT_EXT}")),
        }
    }

    /// Create the directory and an empty document file if absent.
    pub fn open(dir: &Path, name: &str) -> StoreResult<Self> {
        let store = Self::new(dir, name);
        store.ensure()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileDocumentStore {
    fn ensure(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        if !self.path.exists() {
            // Zero bytes decode as an empty document.
            fs::File::create(&self.path)?;
            debug!(path = %self.path.display(), "created document file");
        }
        Ok(())
    }

    fn load(&self) -> StoreResult<Document> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::empty()),
            Err(e) => return Err(e.into()),
        };
        let document = Document::from_json(&text).map_err(|e| StoreError::CorruptDocument {
            path: self.path.display().to_string(),
            reason: match e {
                TypeError::Serialization(reason) => reason,
                other => other.to_string(),
            },
        })?;
        debug!(path = %self.path.display(), entries = document.len(), "read document");
        Ok(document)
    }

    fn save(&self, document: &Document) -> StoreResult<()> {
        let json = document.to_json()?;
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(
            path = %self.path.display(),
            entries = document.len(),
            bytes = json.len(),
            "wrote document"
        );
        Ok(())
    }

    fn purge(&self) -> StoreResult<()> {
        self.destroy()?;
        self.ensure()
    }

    fn destroy(&self) -> StoreResult<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(dir = %self.dir.display(), "removed collection directory");
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelf_types::{into_record, Timestamp};

    fn doc_with(n: usize) -> Document {
        let entries = (0..n)
            .map(|i| into_record(json!({"_id": format!("id{i}"), "n": i})).unwrap())
            .collect();
        Document::with_entries(entries)
    }

    #[test]
    fn open_creates_directory_and_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("movies");
        let store = FileDocumentStore::open(&dir, "movies").unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.path(), dir.join("movies.json"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn open_keeps_existing_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(tmp.path(), "movies").unwrap();
        store.save(&doc_with(2)).unwrap();

        let reopened = FileDocumentStore::open(tmp.path(), "movies").unwrap();
        assert_eq!(reopened.load().unwrap().len(), 2);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(tmp.path(), "c").unwrap();
        let doc = doc_with(3);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(tmp.path(), "c").unwrap();
        store.save(&doc_with(1)).unwrap();
        store.save(&doc_with(2)).unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("c.json")]);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(tmp.path(), "ghost");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(tmp.path(), "c").unwrap();
        fs::write(store.path(), "{\"entries\": [").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }), "got {err}");
    }

    #[test]
    fn reads_documents_written_by_hand() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(tmp.path(), "c").unwrap();
        fs::write(
            store.path(),
            r#"{"updated_at": 1000, "entries": [{"_id": "x", "_ts": 1, "title": "Heat"}]}"#,
        )
        .unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.updated_at, Timestamp::from_millis(1000));
        assert_eq!(doc.entries[0]["title"], json!("Heat"));
    }

    #[test]
    fn purge_recreates_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("c");
        let store = FileDocumentStore::open(&dir, "c").unwrap();
        store.save(&doc_with(2)).unwrap();
        fs::write(dir.join("stray.txt"), "x").unwrap();

        store.purge().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(!dir.join("stray.txt").exists());
    }

    #[test]
    fn destroy_removes_directory_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("c");
        let store = FileDocumentStore::open(&dir, "c").unwrap();

        store.destroy().unwrap();
        assert!(!dir.exists());
        store.destroy().unwrap();
    }
}
