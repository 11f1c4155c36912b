//! Collection registry for Shelf.
//!
//! A [`Db`] owns a storage root directory and hands out shared
//! [`Collection`]s, one per case-insensitive name, each stored as
//! `<root>/<name>/<name>.json`.
//!
//! # Architecture
//!
//! - **Configuration** comes from [`DbConfig`], usually parsed from TOML. It is
//!   validated in full before anything on disk changes.
//! - **Provisioning** happens on first [`Db::select`]: the directory and an
//!   empty document are created and the collection is registered.
//! - **Loading**: on open, every valid collection directory already under the
//!   root is registered, and an optional schema file pre-provisions the
//!   collections it names.
//! - **Lifecycle**: [`Db::remove_collection`], [`Db::empty_collection`], and
//!   [`Db::reset`] delete storage. `reset` is irreversible.
//!
//! There is no process-global state; pass the `Db` to whatever needs it.
//!
//! ```no_run
//! use serde_json::json;
//! use shelf_db::{Db, DbConfig};
//!
//! let db = Db::open(DbConfig::with_storage_root("stores/db"))?;
//! let tosters = db.select("tosters", None)?;
//! let id = tosters.add(json!({"type": "movie", "title": "The Godfather"}))?;
//! assert_eq!(tosters.count()?, 1);
//! tosters.remove(id.as_str())?;
//! # Ok::<(), shelf_db::DbError>(())
//! ```
//!
//! # Modules
//!
//! - [`config`]: [`DbConfig`] and TOML loading
//! - [`db`]: the [`Db`] registry
//! - [`error`]: [`DbError`]
//! - [`names`]: collection name validation
//! - [`schema`]: schema mapping files

pub mod config;
pub mod db;
pub mod error;
pub mod names;
pub mod schema;

pub use config::{DbConfig, DEFAULT_STORAGE_ROOT, MAX_TEXT_LENGTH};
pub use db::{open_at, Db};
pub use error::{DbError, DbResult};
pub use names::{normalize_collection_name, validate_collection_name};
pub use schema::{FieldSpec, SchemaMap};

pub use shelf_query::{deep_search, Finder, Page, Predicate, Projection, SortOrder};
pub use shelf_store::{Collection, CollectionSchema, StoreError};
pub use shelf_types::{Record, RecordId};
