//! Collection name validation.
//!
//! Valid collection names:
//! - Must be non-empty
//! - Must start with an ASCII letter or `_`
//! - May continue with ASCII letters, digits, or `_`
//!
//! Names are case-insensitive: `Tosters` and `tosters` are one collection,
//! stored under the lower-cased name.

use crate::error::{DbError, DbResult};

/// Validate a collection name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use shelf_db::names::validate_collection_name;
///
/// assert!(validate_collection_name("tosters").is_ok());
/// assert!(validate_collection_name("_Movies2").is_ok());
/// assert!(validate_collection_name("bad name!").is_err());
/// assert!(validate_collection_name("9lives").is_err());
/// ```
pub fn validate_collection_name(name: &str) -> DbResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DbError::InvalidCollectionName {
            name: name.to_string(),
            reason: "collection name must not be empty".into(),
        });
    };

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(DbError::InvalidCollectionName {
            name: name.to_string(),
            reason: format!("must start with a letter or '_', found {first:?}"),
        });
    }

    if let Some(ch) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(DbError::InvalidCollectionName {
            name: name.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }

    Ok(())
}

/// Validate `name` and return the registry key it maps to.
pub fn normalize_collection_name(name: &str) -> DbResult<String> {
    validate_collection_name(name)?;
    Ok(name.to_ascii_lowercase())
}
