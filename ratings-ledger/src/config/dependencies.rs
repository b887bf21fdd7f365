use std::sync::Arc;

use ratings_ledger_engine::{
    ChannelHub, HttpNotificationChannel, NotificationChannel, NotificationDispatcher,
    RatingsService,
};
use ratings_ledger_repository::{InMemoryRatingsRepository, PostgresRatingsRepository};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::{AppConfig, NotificationBackend, StorageBackend};
use crate::errors::AppError;

/// `Dependencies` holds the components the HTTP server is built from.
///
/// `hub` is only present with in-process notifications; it backs the
/// activity stream endpoint.
pub struct Dependencies {
    pub service: RatingsService,
    pub hub: Option<ChannelHub>,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// Connects to storage (applying migrations when configured) and builds the
    /// notification channel selected by the configuration.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or an
    /// `AppError` if any dependency fails to initialize.
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        let (channel, hub): (Arc<dyn NotificationChannel>, Option<ChannelHub>) =
            match &config.notification {
                NotificationBackend::InProcess => {
                    let hub = ChannelHub::default();
                    (Arc::new(hub.clone()), Some(hub))
                }
                NotificationBackend::Http { relay_url } => {
                    info!(relay_url = %relay_url, "Using HTTP notification relay");
                    let channel =
                        HttpNotificationChannel::new(relay_url.clone(), config.notify_timeout)?;
                    (Arc::new(channel), None)
                }
            };
        let dispatcher = NotificationDispatcher::new(channel, config.notify_timeout);

        let service = match &config.storage {
            StorageBackend::Memory => {
                warn!("Using in-memory storage, data will not survive a restart");
                RatingsService::from_repository(Arc::new(InMemoryRatingsRepository::new()), dispatcher)
            }
            StorageBackend::Postgres {
                database_url,
                max_connections,
                run_migrations,
            } => {
                let pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await?;
                let repository = PostgresRatingsRepository::new(pool).await?;
                if *run_migrations {
                    repository.migrate().await?;
                    info!("Database migrations applied");
                }
                if !repository.check_tables_created().await? {
                    return Err(AppError::config(
                        "database schema is missing, run with RUN_MIGRATIONS=true",
                    ));
                }
                RatingsService::from_repository(Arc::new(repository), dispatcher)
            }
        };

        Ok(Self { service, hub })
    }
}
