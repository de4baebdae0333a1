pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod plant_mapper;
pub mod prediction;

pub use client::{ConnectionState, Connector, PredictionClient, TcpConnector};
pub use config::ClientConfig;
pub use error::{ClientError, ConnectionErrorKind};
pub use prediction::diagnose;
