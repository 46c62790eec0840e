//! Pagination module
//!
//! Cursor-based streaming pagination over remote ordered key-value
//! collections.
//!
//! # Overview
//!
//! A [`CursorPaginator`] turns any [`RemoteCollection`] into a lazy stream of
//! non-empty [`Page`]s. The key of the last entry of each page is the cursor
//! for the next request. By default every page is preceded by a key probe so
//! that exhaustion is detected without ever asking the store for entries past
//! its last key.

mod strategies;
mod types;

pub use strategies::{paginate, CursorPaginator};
pub use types::{Exhaustion, Page, PaginationState, RemoteCollection, StorageKey};
