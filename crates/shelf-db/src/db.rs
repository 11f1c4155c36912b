use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use shelf_store::{Collection, CollectionOptions, CollectionSchema};
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::names::normalize_collection_name;
use crate::schema::SchemaMap;

/// The collection registry.
///
/// A `Db` owns a storage root and the collections registered under it. Each
/// collection lives in `<root>/<name>/<name>.json` and is shared as an
/// `Arc<Collection>`; selecting the same name twice, in any letter case,
/// returns the same instance.
///
/// Lock order is registry map first, then configuration.
pub struct Db {
    config: RwLock<DbConfig>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Db {
    /// Validate `config`, create the storage root, and load what it holds.
    pub fn open(config: DbConfig) -> DbResult<Self> {
        let db = Self {
            config: RwLock::new(config.clone()),
            collections: RwLock::new(HashMap::new()),
        };
        db.configure(config)?;
        let root = db.storage_root()?;
        info!(root = %root.display(), "opened database");
        Ok(db)
    }

    /// Release the registry. Collections still shared elsewhere stay usable.
    pub fn close(self) {
        let count = self.collections.read().map(|m| m.len()).unwrap_or_default();
        info!(collections = count, "closed database");
    }

    /// Apply a new configuration.
    ///
    /// Nothing changes if validation or schema parsing fails. Switching to a
    /// different storage root unregisters the collections of the old one
    /// without touching their files.
    pub fn configure(&self, config: DbConfig) -> DbResult<()> {
        config.validate()?;
        let schema = config.schema_path.as_deref().map(SchemaMap::load).transpose()?;
        fs::create_dir_all(&config.storage_root)?;

        {
            let mut map = self.collections.write().map_err(|_| DbError::LockPoisoned)?;
            let mut current = self.config.write().map_err(|_| DbError::LockPoisoned)?;
            if current.storage_root != config.storage_root && !map.is_empty() {
                debug!(
                    from = %current.storage_root.display(),
                    to = %config.storage_root.display(),
                    dropped = map.len(),
                    "storage root changed"
                );
                map.clear();
            }
            *current = config.clone();
        }

        if config.load_existing {
            self.load_existing()?;
        }
        if let Some(schema) = schema {
            for (name, fields) in schema.schemas() {
                self.select(name, Some(fields))?;
            }
            info!(collections = schema.len(), "applied schema");
        }
        Ok(())
    }

    /// A copy of the active configuration.
    pub fn config(&self) -> DbResult<DbConfig> {
        Ok(self.config.read().map_err(|_| DbError::LockPoisoned)?.clone())
    }

    pub fn storage_root(&self) -> DbResult<PathBuf> {
        Ok(self.config()?.storage_root)
    }

    /// Return the collection `name`, creating its storage on first use.
    ///
    /// `schema` is only used when the collection is created by this call.
    pub fn select(&self, name: &str, schema: Option<CollectionSchema>) -> DbResult<Arc<Collection>> {
        let key = normalize_collection_name(name)?;
        if let Some(collection) = self.lookup(&key)? {
            return Ok(collection);
        }

        let mut map = self.collections.write().map_err(|_| DbError::LockPoisoned)?;
        // Another thread may have provisioned it while we waited.
        if let Some(collection) = map.get(&key) {
            return Ok(Arc::clone(collection));
        }

        let config = self.config()?;
        let collection = Arc::new(self.open_collection(&config, &key, schema.unwrap_or_default())?);
        info!(collection = %key, "provisioned collection");
        map.insert(key, Arc::clone(&collection));
        Ok(collection)
    }

    /// The registered collection `name`, without provisioning.
    pub fn get(&self, name: &str) -> DbResult<Option<Arc<Collection>>> {
        let key = normalize_collection_name(name)?;
        self.lookup(&key)
    }

    /// Delete the storage of `name` and unregister it. `false` if unknown.
    ///
    /// The registry stays locked until the storage is gone, so a concurrent
    /// [`select`](Self::select) cannot provision a directory that is about to
    /// be deleted. If deletion fails the collection stays registered.
    ///
    /// Handles obtained earlier keep working against the deleted directory;
    /// a write through one recreates it.
    pub fn remove_collection(&self, name: &str) -> DbResult<bool> {
        let key = normalize_collection_name(name)?;
        let mut map = self.collections.write().map_err(|_| DbError::LockPoisoned)?;
        let Some(collection) = map.get(&key) else {
            return Ok(false);
        };
        collection.destroy()?;
        map.remove(&key);
        info!(collection = %key, "removed collection");
        Ok(true)
    }

    /// Delete every record of `name`, keeping it registered. `false` if
    /// unknown.
    pub fn empty_collection(&self, name: &str) -> DbResult<bool> {
        let key = normalize_collection_name(name)?;
        match self.lookup(&key)? {
            Some(collection) => {
                collection.clear()?;
                info!(collection = %key, "emptied collection");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unregister every collection and recreate the storage root empty.
    ///
    /// **Irreversible**: everything under the storage root is deleted,
    /// including files this registry never created.
    pub fn reset(&self) -> DbResult<()> {
        let mut map = self.collections.write().map_err(|_| DbError::LockPoisoned)?;
        let root = self.storage_root()?;
        match fs::remove_dir_all(&root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&root)?;
        let dropped = map.len();
        map.clear();
        warn!(root = %root.display(), dropped, "reset database");
        Ok(())
    }

    /// Registered collection names, sorted.
    pub fn collections(&self) -> DbResult<Vec<String>> {
        let map = self.collections.read().map_err(|_| DbError::LockPoisoned)?;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn lookup(&self, key: &str) -> DbResult<Option<Arc<Collection>>> {
        let map = self.collections.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn open_collection(
        &self,
        config: &DbConfig,
        key: &str,
        schema: CollectionSchema,
    ) -> DbResult<Collection> {
        let options = CollectionOptions::default()
            .with_caching_time(config.caching_time())
            .with_schema(schema);
        Ok(Collection::open(key, &config.storage_root.join(key), options)?)
    }

    /// Register every collection directory already under the storage root.
    fn load_existing(&self) -> DbResult<()> {
        let config = self.config()?;
        let mut map = self.collections.write().map_err(|_| DbError::LockPoisoned)?;
        let mut loaded = 0usize;

        for entry in fs::read_dir(&config.storage_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(raw) = file_name.to_str() else {
                warn!(dir = ?entry.path(), "skipping non-UTF-8 directory");
                continue;
            };
            let key = match normalize_collection_name(raw) {
                Ok(key) => key,
                Err(e) => {
                    warn!(dir = %entry.path().display(), error = %e, "skipping directory");
                    continue;
                }
            };
            if map.contains_key(&key) {
                continue;
            }
            if key != raw {
                warn!(dir = %entry.path().display(), "collection directory is not lower-case");
            }

            let collection = self.open_collection(&config, &key, CollectionSchema::default())?;
            map.insert(key, Arc::new(collection));
            loaded += 1;
        }

        info!(root = %config.storage_root.display(), loaded, "loaded existing collections");
        Ok(())
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let root = self.config.read().map(|c| c.storage_root.clone()).ok();
        f.debug_struct("Db").field("storage_root", &root).finish_non_exhaustive()
    }
}

/// Open a registry on `root` with default settings.
pub fn open_at(root: impl AsRef<Path>) -> DbResult<Db> {
    Db::open(DbConfig::with_storage_root(root.as_ref()))
}
