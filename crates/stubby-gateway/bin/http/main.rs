mod cli;

use crate::cli::{Cli, StorageBackendArg};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use stubby_core::Shortener;
use stubby_gateway::{App, AppState};
use stubby_generator::{GeneratorSettings, RandomGenerator};
use stubby_shortener::{ShortenerService, ShortenerSettings};
use stubby_storage::{InMemoryRepository, PostgresRepository, TimeoutRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse();
    init_tracing(config.log_json);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        store_timeout_ms = config.store_timeout_ms,
        max_allocation_attempts = config.max_allocation_attempts,
        "starting stubby gateway"
    );

    let deadline = Duration::from_millis(config.store_timeout_ms);
    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_allocation_attempts)
        .build();
    let generator = RandomGenerator::new(GeneratorSettings::default())?;

    let shortener: Arc<dyn Shortener> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(ShortenerService::new(
            TimeoutRepository::new(InMemoryRepository::new(), deadline),
            generator,
            settings,
        )),
        StorageBackendArg::Postgres => {
            let dsn = config
                .postgres_dsn
                .ok_or("postgres dsn is required when storage backend is postgres")?;
            let repository =
                PostgresRepository::connect(&dsn, config.postgres_max_connections, deadline)
                    .await?;
            repository.migrate().await?;
            Arc::new(ShortenerService::new(
                TimeoutRepository::new(repository, deadline),
                generator,
                settings,
            ))
        }
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(AppState::new(shortener)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
