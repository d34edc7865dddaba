//! Roster server binary.
//!
//! Builds the configured store backend, prepares the employee collection and
//! serves the HTTP API until interrupted.

use std::sync::Arc;

use roster_core::backend::{StoreBackend, StoreBackendBuilder};
use roster_memory::InMemoryStore;
use roster_mongodb::MongoStore;
use roster_server::{
    config::{BackendKind, Config},
    routes,
    service::EmployeeService,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    match config.backend {
        BackendKind::Memory => {
            info!("starting with in-memory store");
            let backend = InMemoryStore::builder().build().await?;
            serve(config, backend).await
        }
        BackendKind::MongoDb => {
            info!(url = %config.mongodb_url, database = %config.database_name, "starting with MongoDB store");
            let backend = MongoStore::builder(&config.mongodb_url, &config.database_name)
                .build()
                .await?;
            serve(config, backend).await
        }
    }
}

async fn serve<B: StoreBackend + 'static>(
    config: Config,
    backend: B,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(EmployeeService::new(backend));

    // Unique employee_id enforcement lives in the store; establish the index
    // before accepting writes.
    service.init().await?;

    let app = routes::router(service.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await?;
    info!("store closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
}
