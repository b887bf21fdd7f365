use dotenv::dotenv;
use ratings_ledger::config::LogFormat;
use ratings_ledger::server::{create_app, run_server, state::AppState};
use ratings_ledger::{AppConfig, Dependencies};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with structured logging.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ratings_ledger=info,ratings_ledger_engine=info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();
        }
    }

    info!(
        service_name = "ratings-ledger",
        service_version = env!("CARGO_PKG_VERSION"),
        log_format = ?format,
        "Tracing initialized"
    );
}

/// Main entry point for the Ratings Ledger server.
///
/// Loads the configuration, wires storage and notifications, and serves the
/// HTTP API until ctrl-c.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    init_tracing(config.log_format);

    info!(addr = %config.server_addr, "Starting Ratings Ledger");

    let dependencies = match Dependencies::new(&config).await {
        Ok(dependencies) => {
            info!("Dependencies initialized successfully");
            dependencies
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e.into());
        }
    };

    let app = create_app(AppState::from(dependencies));
    run_server(app, config.server_addr).await?;

    info!("Ratings Ledger stopped");
    Ok(())
}
