use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::record::Record;
use crate::temporal::Timestamp;

/// The on-disk unit for one collection.
///
/// ```text
/// { "updated_at": <ms>, "entries": [ <Record>, ... ] }
/// ```
///
/// Entries are newest-first: additions are prepended. A file that carries no
/// `entries` key decodes as an empty list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Time of the last write.
    #[serde(default)]
    pub updated_at: Timestamp,
    /// Ordered records.
    #[serde(default)]
    pub entries: Vec<Record>,
}

impl Document {
    /// An empty document stamped with the current time.
    pub fn empty() -> Self {
        Self {
            updated_at: Timestamp::now(),
            entries: Vec::new(),
        }
    }

    /// A document holding `entries`, stamped with the current time.
    pub fn with_entries(entries: Vec<Record>) -> Self {
        Self {
            updated_at: Timestamp::now(),
            entries,
        }
    }

    /// Refresh `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a document from raw file contents.
    ///
    /// Blank input is an empty document rather than an error.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}
