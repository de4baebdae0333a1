pub mod cache;
pub mod config;
pub mod inference;
pub mod server;
pub mod service;

#[cfg(test)]
mod testing;

pub use cache::{ModelRegistry, RegistryError};
pub use config::ServerConfig;
pub use service::{PredictionService, ServiceError};
