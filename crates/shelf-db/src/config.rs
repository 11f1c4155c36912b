use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Storage root used when none is configured.
pub const DEFAULT_STORAGE_ROOT: &str = "stores/db";

/// Upper bound, and default, of [`DbConfig::max_text_length`].
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Registry configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// storage_root = "/var/lib/shelf"
/// caching_time_secs = 30
/// schema_path = "/etc/shelf/schema.json"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Directory holding one sub-directory per collection.
    pub storage_root: PathBuf,
    /// Advisory bound on text length. Validated here, not enforced on records.
    pub max_text_length: usize,
    /// JSON mapping of collection name to field list, provisioned on configure.
    pub schema_path: Option<PathBuf>,
    /// Staleness window of each collection's read cache.
    pub caching_time_secs: u64,
    /// Register the collections already present under `storage_root`.
    pub load_existing: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            max_text_length: MAX_TEXT_LENGTH,
            schema_path: None,
            caching_time_secs: 300,
            load_existing: true,
        }
    }
}

impl DbConfig {
    /// Defaults with a different storage root.
    pub fn with_storage_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> DbResult<Self> {
        toml::from_str(text).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> DbResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check every value without touching the storage root.
    pub fn validate(&self) -> DbResult<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(DbError::Config("storage_root must not be empty".into()));
        }
        if self.max_text_length == 0 || self.max_text_length > MAX_TEXT_LENGTH {
            return Err(DbError::Config(format!(
                "max_text_length must be between 1 and {MAX_TEXT_LENGTH}, got {}",
                self.max_text_length
            )));
        }
        if let Some(path) = &self.schema_path {
            if !path.is_file() {
                return Err(DbError::Config(format!(
                    "schema_path {} is not a file",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn caching_time(&self) -> Duration {
        Duration::from_secs(self.caching_time_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DbConfig::default();
        assert_eq!(c.storage_root, PathBuf::from("stores/db"));
        assert_eq!(c.max_text_length, 10_000);
        assert_eq!(c.caching_time(), Duration::from_secs(300));
        assert!(c.load_existing);
        assert!(c.schema_path.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = DbConfig::from_toml_str("storage_root = \"/tmp/x\"\ncaching_time_secs = 0\n").unwrap();
        assert_eq!(c.storage_root, PathBuf::from("/tmp/x"));
        assert_eq!(c.caching_time(), Duration::ZERO);
        assert_eq!(c.max_text_length, MAX_TEXT_LENGTH);
        assert!(c.load_existing);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = DbConfig::from_toml_str("storage_root = ").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shelf.toml");
        fs::write(&path, "max_text_length = 500\nload_existing = false\n").unwrap();

        let c = DbConfig::load(&path).unwrap();
        assert_eq!(c.max_text_length, 500);
        assert!(!c.load_existing);
        assert!(matches!(
            DbConfig::load(&tmp.path().join("missing.toml")).unwrap_err(),
            DbError::Config(_)
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let empty_root = DbConfig::with_storage_root("");
        let zero = DbConfig { max_text_length: 0, ..DbConfig::default() };
        let huge = DbConfig { max_text_length: 10_001, ..DbConfig::default() };
        let no_schema = DbConfig {
            schema_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..DbConfig::default()
        };
        for c in [empty_root, zero, huge, no_schema] {
            assert!(matches!(c.validate().unwrap_err(), DbError::Config(_)), "{c:?}");
        }
    }

    #[test]
    fn max_text_length_bounds_are_inclusive() {
        for ok in [1, 9_999, MAX_TEXT_LENGTH] {
            let c = DbConfig { max_text_length: ok, ..DbConfig::default() };
            assert!(c.validate().is_ok(), "{ok}");
        }
    }

    #[test]
    fn toml_roundtrip() {
        let c = DbConfig {
            schema_path: Some(PathBuf::from("schema.json")),
            caching_time_secs: 12,
            ..DbConfig::default()
        };
        let text = toml::to_string(&c).unwrap();
        assert_eq!(DbConfig::from_toml_str(&text).unwrap(), c);
    }
}
