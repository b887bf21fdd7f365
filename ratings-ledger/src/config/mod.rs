//! Configuration module for the Ratings Ledger.
//! Reads application settings from the environment and wires dependencies.
mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 2000;

/// Where ratings, votes and activities are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
        run_migrations: bool,
    },
    /// Process-local store; everything is lost on exit.
    Memory,
}

/// How recipients are woken after their activities commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationBackend {
    /// In-process channel hub, streamed to clients over SSE.
    InProcess,
    /// Remote relay with one addressable channel per user.
    Http { relay_url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub notification: NotificationBackend,
    pub server_addr: SocketAddr,
    pub notify_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STORAGE_BACKEND`: "postgres" or "memory" (default: postgres)
    /// - `DATABASE_URL`: PostgreSQL connection string, required for postgres
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
    /// - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: true)
    /// - `SERVER_ADDR`: Listen address (default: 127.0.0.1:8080)
    /// - `NOTIFICATION_BACKEND`: "memory" or "http" (default: memory)
    /// - `NOTIFICATION_RELAY_URL`: Relay base URL, required for http
    /// - `NOTIFY_TIMEOUT_MS`: Per-signal delivery timeout (default: 2000)
    /// - `LOG_FORMAT`: "pretty" or "json" (default: pretty)
    ///
    /// # Returns
    ///
    /// * `Ok(AppConfig)` - Parsed configuration
    /// * `Err(AppError::Config)` - A variable is invalid or a required one is missing
    pub fn from_env() -> Result<Self, AppError> {
        let storage = match optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageBackend::Postgres {
                database_url: required("DATABASE_URL")?,
                max_connections: parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                run_migrations: flag("RUN_MIGRATIONS", true)?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::config(format!(
                    "STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let notification = match optional("NOTIFICATION_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => NotificationBackend::InProcess,
            "http" => NotificationBackend::Http {
                relay_url: required("NOTIFICATION_RELAY_URL")?,
            },
            other => {
                return Err(AppError::config(format!(
                    "NOTIFICATION_BACKEND must be 'memory' or 'http', got '{other}'"
                )));
            }
        };

        let log_format = match optional("LOG_FORMAT")
            .map(|value| value.to_lowercase())
            .as_deref()
        {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )));
            }
        };

        let server_addr = parsed(
            "SERVER_ADDR",
            SocketAddr::from_str(DEFAULT_SERVER_ADDR)
                .map_err(|e| AppError::config(e.to_string()))?,
        )?;
        let notify_timeout =
            Duration::from_millis(parsed("NOTIFY_TIMEOUT_MS", DEFAULT_NOTIFY_TIMEOUT_MS)?);

        Ok(Self {
            storage,
            notification,
            server_addr,
            notify_timeout,
            log_format,
        })
    }
}

/// Reads a variable, treating empty values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &str) -> Result<String, AppError> {
    optional(name).ok_or_else(|| AppError::config(format!("{name} must be set")))
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value '{value}'"))),
        None => Ok(default),
    }
}

fn flag(name: &str, default: bool) -> Result<bool, AppError> {
    match optional(name).map(|value| value.to_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(AppError::config(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}
