//! Field lists attached to a collection.
//!
//! A schema only names fields. It is used to report which named fields a
//! record lacks; records are never rejected or type-checked against it.

use shelf_types::Record;

/// The field names a collection is expected to carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionSchema {
    fields: Vec<String>,
}

impl CollectionSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Schema fields absent from `record`, in schema order.
    pub fn missing_fields<'a>(&'a self, record: &Record) -> Vec<&'a str> {
        self.fields
            .iter()
            .filter(|f| !record.contains_key(f.as_str()))
            .map(String::as_str)
            .collect()
    }
}
