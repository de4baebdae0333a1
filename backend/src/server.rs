use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;

use crate::cache::{ModelRegistry, RegistryError};
use crate::config::{ConfigError, ServerConfig};
use crate::inference::ModelLoader;
use crate::service::PredictionService;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model preload failed: {0}")]
    Preload(#[from] RegistryError),
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Builds the registry from `config`, preloads the configured plants and
/// serves `plant.Predictor` until Ctrl-C.
pub async fn run<L: ModelLoader>(config: &ServerConfig, loader: L) -> Result<(), ServerError> {
    let addr: SocketAddr = config.socket_addr()?;
    let registry = Arc::new(ModelRegistry::new(loader, config.model_paths()));

    if !config.preload.is_empty() {
        log::info!("Preloading models: {:?}", config.preload);
        registry.preload(&config.preload).await?;
    }

    let service = PredictionService::new(registry);
    log::info!("Starting gRPC server on {}", addr);

    Server::builder()
        .add_service(service.into_server())
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    log::info!("gRPC server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => {
            log::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
