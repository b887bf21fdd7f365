//! PostgreSQL implementation of the ratings ledger repository.
//!
//! Provides a production-ready PostgreSQL backend for every repository trait
//! with connection pooling and transaction safety.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - One `sqlx::Transaction` per ledger unit of work, rolled back on drop
//! - Row locks (`SELECT ... FOR UPDATE`) serializing voters on the same entity
//! - Relative, zero-clamped counter updates evaluated by the database
//! - Keyset pagination composed with `QueryBuilder` and bound parameters
//!
//! ## Database Tables
//!
//! - `ratings`, `comments`: votable entities carrying the counter projection
//! - `rating_votes`, `comment_votes`: the vote ledger, one row per (entity, user)
//! - `activities`: append-only, soft-deletable notifications
//! - `users`: display info mirrored from the authentication system
mod activity;
mod content;
mod ledger;
mod rows;
mod users;

pub use ledger::PostgresLedgerTransaction;

use ratings_ledger_shared::PageFilter;
use ratings_ledger_shared::types::EntityType;
use sqlx::{Postgres, QueryBuilder};

use crate::RepositoryError;

/// Tables the repository expects once migrations have run.
const REQUIRED_TABLES: [&str; 6] = [
    "users",
    "ratings",
    "comments",
    "rating_votes",
    "comment_votes",
    "activities",
];

/// PostgreSQL implementation of the ratings ledger repository.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct PostgresRatingsRepository {
    pool: sqlx::PgPool,
}

impl PostgresRatingsRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresRatingsRepository)` - Ready-to-use repository instance
    /// * `Err(RepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RepositoryError> {
        Ok(Self { pool })
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("src/postgres/migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Checks that every table the repository needs exists.
    pub async fn check_tables_created(&self) -> Result<bool, RepositoryError> {
        for table in REQUIRED_TABLES {
            let table_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
            if !table_exists {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

fn entity_table(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Rating => "ratings",
        EntityType::Comment => "comments",
    }
}

fn vote_table(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Rating => "rating_votes",
        EntityType::Comment => "comment_votes",
    }
}

/// Appends the keyset predicate of `filter` as an `AND` clause.
///
/// Renders `(created_at < $c OR (created_at = $c AND id < $i))` with bound
/// parameters; the first page adds nothing.
fn push_page_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &PageFilter,
    created_at_column: &str,
    id_column: &str,
) {
    if let Some(cursor) = filter.cursor() {
        builder
            .push(" AND (")
            .push(created_at_column)
            .push(" < ")
            .push_bind(cursor.created_at)
            .push(" OR (")
            .push(created_at_column)
            .push(" = ")
            .push_bind(cursor.created_at)
            .push(" AND ")
            .push(id_column)
            .push(" < ")
            .push_bind(cursor.id)
            .push("))");
    }
}
