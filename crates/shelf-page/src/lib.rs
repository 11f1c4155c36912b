//! Fixed-size pagination for Shelf.
//!
//! [`paginate`] divides a sequence into consecutive windows of at most
//! `per_page` items. Every [`Page`] carries its 1-based position within the
//! full sequence so callers can render "11-20 of 57" without extra state.
//!
//! The paginator is pure: no state, no I/O.

pub mod error;
pub mod page;

pub use error::{PageError, PageResult};
pub use page::{paginate, Page};
