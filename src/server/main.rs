use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use todo_api::adapters::HttpServer;
use todo_api::config::{AppConfig, StorageBackend};
use todo_api::core::{TodoService, wait_for_storage};
use todo_api::storage::Storage;
use todo_api::storage::memory::MemoryStorage;
use todo_api::storage::postgres::PostgresStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    {
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
            .init();
    }
    let config = AppConfig::from_env().context("invalid configuration")?;

    match config.backend {
        StorageBackend::Memory => {
            let storage = if config.seed_demo_data {
                MemoryStorage::seeded()
            } else {
                MemoryStorage::new()
            };
            serve(Arc::new(storage), &config).await
        }
        StorageBackend::Postgres => {
            let storage = Arc::new(PostgresStorage::connect_lazy(&config.database));
            wait_for_storage(storage.as_ref(), config.connect_retry, config.connect_required)
                .await
                .context("database never became reachable")?;
            if let Err(e) = storage.migrate().await {
                if config.connect_required {
                    return Err(e);
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Skipping schema migration");
            }
            serve(storage, &config).await
        }
    }
}

async fn serve<S: Storage + 'static>(storage: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = HttpServer::bind(TodoService::new(storage), addr).await?;
    #[cfg(feature = "tracing")]
    tracing::info!(
        url = %format!("http://localhost:{}", config.port),
        environment = %config.environment,
        backend = ?config.backend,
        database = %format!("{}:{}", config.database.host, config.database.port),
        "Server is running"
    );
    server.run().await
}
