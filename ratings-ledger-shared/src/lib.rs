//! # Ratings Ledger Shared
//! This crate defines the data structures shared across the ratings ledger
//! workspace: votes and their counter projection, activities, ratings and
//! comments, user display info, and the keyset cursor paginator used by every
//! list endpoint.
pub mod pagination;
pub mod types;

pub use pagination::{Cursor, CursorPaginator, Page, PageFilter, PageRequest};
