//! # Ratings Ledger Repository
//! This crate provides traits and implementations for interacting with the
//! ratings data store. It includes definitions for errors, interfaces, and
//! concrete implementations for PostgreSQL and for an in-process memory store.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{
    ActivityRepository, ContentRepository, LedgerRepository, LedgerTransaction, UserDirectory,
};
pub use memory::InMemoryRatingsRepository;
pub use postgres::PostgresRatingsRepository;
