//! Schema mapping files.
//!
//! A schema file is a JSON object from collection name to field list. A field
//! is either a bare name or an object with a `name` key and any other
//! descriptive keys, which are kept but not interpreted:
//!
//! ```json
//! {
//!   "tosters": ["type", {"name": "title", "label": "Title"}, "imdb"],
//!   "users": {"fields": ["email"]}
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use shelf_store::CollectionSchema;

use crate::error::{DbError, DbResult};
use crate::names::normalize_collection_name;

/// One field descriptor.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Name(String),
    Described {
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Described { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum CollectionEntry {
    Fields(Vec<FieldSpec>),
    Described { fields: Vec<FieldSpec> },
}

impl CollectionEntry {
    fn into_fields(self) -> Vec<FieldSpec> {
        match self {
            Self::Fields(fields) | Self::Described { fields } => fields,
        }
    }
}

/// Field descriptors per collection, keyed by normalized collection name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaMap {
    collections: BTreeMap<String, Vec<FieldSpec>>,
}

impl SchemaMap {
    /// Parse schema JSON. `origin` names the source in errors.
    ///
    /// Every key must be a valid collection name, and no two keys may differ
    /// only in letter case.
    pub fn from_json_str(text: &str, origin: &str) -> DbResult<Self> {
        let schema_error = |reason: String| DbError::Schema {
            path: origin.to_string(),
            reason,
        };
        let raw: BTreeMap<String, CollectionEntry> =
            serde_json::from_str(text).map_err(|e| schema_error(e.to_string()))?;

        let mut collections = BTreeMap::new();
        for (name, entry) in raw {
            let key = normalize_collection_name(&name).map_err(|e| schema_error(e.to_string()))?;
            if collections.insert(key, entry.into_fields()).is_some() {
                return Err(schema_error(format!("collection {name:?} is listed twice")));
            }
        }
        Ok(Self { collections })
    }

    pub fn load(path: &Path) -> DbResult<Self> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| DbError::Schema {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text, &origin)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn fields(&self, collection: &str) -> Option<&[FieldSpec]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    /// Collection names with their field lists, in name order.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, CollectionSchema)> + '_ {
        self.collections.iter().map(|(name, fields)| {
            (name.as_str(), CollectionSchema::new(fields.iter().map(FieldSpec::name)))
        })
    }
}
