//! Foundation types for Shelf.
//!
//! Shelf keeps every collection as a single JSON document on disk. This crate
//! defines the shapes that flow between the other Shelf crates.
//!
//! # Key Types
//!
//! - [`Record`]: An open JSON object with the reserved `_id` / `_ts` fields
//! - [`RecordId`]: 32-character opaque record identifier
//! - [`Timestamp`]: Wall-clock milliseconds since the UNIX epoch
//! - [`Document`]: The on-disk unit: `updated_at` plus ordered `entries`

pub mod document;
pub mod error;
pub mod id;
pub mod record;
pub mod temporal;

pub use document::Document;
pub use error::TypeError;
pub use id::RecordId;
pub use record::{into_record, record_id, record_timestamp, Record, ID_FIELD, TS_FIELD};
pub use temporal::Timestamp;
