use std::net::SocketAddr;

use dotenv::dotenv;
use meme_arena::config::LogFormat;
use meme_arena::server::{create_app, run_server};
use meme_arena::{ArenaConfig, Dependencies, StartupError};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing(format: LogFormat) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meme_arena=info,meme_arena_engine=info,meme_arena_repository=info"));

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init(),
    };
    initialized.map_err(|e| StartupError::Tracing(e.to_string()))?;

    info!(
        service_name = "meme-arena",
        service_version = env!("CARGO_PKG_VERSION"),
        log_format = ?format,
        "Tracing initialized"
    );
    Ok(())
}

/// Main entry point for the Meme Arena server.
///
/// Loads `.env`, reads the configuration, wires the service and serves HTTP
/// until interrupted.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();

    let config = ArenaConfig::from_env()?;
    init_tracing(config.log_format)?;

    let dependencies = match Dependencies::new(&config).await {
        Ok(dependencies) => {
            info!("Dependencies initialized successfully");
            dependencies
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let app = create_app(dependencies.service, config.cors_origins.clone());
    let addr = SocketAddr::new(config.host, config.port);
    if let Err(e) = run_server(app, addr).await {
        error!(error = %e, "Server failed");
        return Err(e.into());
    }
    info!("Server stopped");
    Ok(())
}
