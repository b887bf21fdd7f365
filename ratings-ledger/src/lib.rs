//! Ratings Ledger Library
//!
//! This library provides the application layer of the ratings service:
//! configuration management, dependency wiring, error handling and the HTTP
//! server exposing the vote ledger, feeds and activity endpoints.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{AppConfig, Dependencies};
pub use errors::AppError;
