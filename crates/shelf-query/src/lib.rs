//! Chainable, in-memory queries over a snapshot of records.
//!
//! A [`Finder`] wraps an immutable snapshot. Each predicate call returns a new
//! narrowed `Finder` that shares the same snapshot, so one base can feed any
//! number of independent queries, including from different threads. Nothing
//! here touches storage.
//!
//! ```
//! use serde_json::json;
//! use shelf_query::Finder;
//! use shelf_types::into_record;
//!
//! let finder = Finder::new(vec![
//!     into_record(json!({"type": "movie", "imdb": 9.2})).unwrap(),
//!     into_record(json!({"type": "series", "imdb": 8.1})).unwrap(),
//! ]);
//! let movies = finder.equals("type", "movie").greater_than("imdb", 9.0).run();
//! assert_eq!(movies.len(), 1);
//! ```
//!
//! # Modules
//!
//! - [`finder`]: The [`Finder`] chain and [`SortOrder`]
//! - [`predicate`]: Comparison semantics for sparse records
//! - [`projection`]: Field selection on returned records
//! - [`deep`]: Key lookup at any depth of a JSON value

pub mod deep;
pub mod error;
pub mod finder;
pub mod predicate;
pub mod projection;

pub use deep::deep_search;
pub use error::{QueryError, QueryResult};
pub use finder::{Finder, SortOrder};
pub use predicate::Predicate;
pub use projection::Projection;
pub use shelf_page::Page;
