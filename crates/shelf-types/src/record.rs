//! The record shape and its reserved fields.

use serde_json::{Map, Value};

use crate::error::TypeError;

/// Field holding a record's identifier. Assigned once on creation.
pub const ID_FIELD: &str = "_id";

/// Field holding a record's creation time. Assigned once on creation.
pub const TS_FIELD: &str = "_ts";

/// One stored item: an open mapping of field name to JSON value.
pub type Record = Map<String, Value>;

/// Unwrap a JSON value into a record, rejecting anything but an object.
pub fn into_record(value: Value) -> Result<Record, TypeError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TypeError::NotAnObject(kind_name(&other))),
    }
}

/// The record's `_id`, if present and a string.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// The record's `_ts` as a number, if present and numeric.
pub fn record_timestamp(record: &Record) -> Option<f64> {
    record.get(TS_FIELD).and_then(Value::as_f64)
}

/// Human-readable JSON type name, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
