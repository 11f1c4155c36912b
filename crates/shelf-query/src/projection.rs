//! Projection: return only selected fields from records.
//!
//! Projection is applied after the record has been found. An empty projection
//! returns the full record; requested fields the record lacks are skipped.

use serde_json::Map;
use shelf_types::Record;

/// An ordered set of field names to keep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Keep every field.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only the given fields. Duplicates are dropped.
    pub fn of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !field.is_empty() && !out.contains(&field) {
                out.push(field);
            }
        }
        Self { fields: out }
    }

    /// Parse a whitespace-delimited field list, e.g. `"title imdb"`.
    pub fn parse(fields: &str) -> Self {
        Self::of(fields.split_whitespace())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns `true` if this projection keeps the whole record.
    pub fn is_all(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply to a record, returning a trimmed copy.
    pub fn apply(&self, record: &Record) -> Record {
        if self.is_all() {
            return record.clone();
        }
        let mut out = Map::new();
        for field in &self.fields {
            if let Some(value) = record.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for Projection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::of(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelf_types::into_record;

    fn record() -> Record {
        into_record(json!({"_id": "a", "title": "Heat", "imdb": 8.3, "year": 1995})).unwrap()
    }

    #[test]
    fn empty_projection_returns_full_record() {
        assert_eq!(Projection::all().apply(&record()), record());
        assert_eq!(Projection::parse("   ").apply(&record()), record());
    }

    #[test]
    fn keeps_only_requested_fields() {
        let trimmed = Projection::parse("title imdb").apply(&record());
        assert_eq!(serde_json::Value::Object(trimmed), json!({"title": "Heat", "imdb": 8.3}));
    }

    #[test]
    fn missing_fields_are_skipped() {
        let trimmed = Projection::of(["title", "director"]).apply(&record());
        assert_eq!(trimmed.len(), 1);
        assert!(!trimmed.contains_key("director"));
    }

    #[test]
    fn parse_collapses_whitespace_and_duplicates() {
        let p = Projection::parse(" title\t imdb  title ");
        assert_eq!(p.fields(), ["title", "imdb"]);
    }
}
