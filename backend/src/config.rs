use serde::{Deserialize, Serialize};
use shared::PlantType;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub const DEFAULT_CONFIG_PATH: &str = "config/server.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid listen address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    /// Per-plant model file, relative to `models_dir`. `null` disables the
    /// plant; plants not listed use their built-in file name.
    pub models: HashMap<PlantType, Option<String>>,
    pub preload: Vec<PlantType>,
    pub input_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50052,
            models_dir: PathBuf::from("models"),
            models: HashMap::new(),
            preload: Vec::new(),
            input_size: 224,
        }
    }
}

impl ServerConfig {
    /// Reads `PREDICTOR_CONFIG` (or `config/server.yaml` when present) and
    /// applies `GRPC_HOST`/`GRPC_PORT` from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("PREDICTOR_CONFIG") {
            Some(path) => Self::from_path(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_path(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Some(host) = lookup("GRPC_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("GRPC_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "GRPC_PORT",
                value: port,
            })?;
        }
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded server config from {}", path.display());
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_yaml::from_str(config_str)?;
        if config.input_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "input_size",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    /// The plant → model file table the registry resolves against.
    pub fn model_paths(&self) -> HashMap<PlantType, PathBuf> {
        PlantType::iter()
            .filter_map(|plant| {
                let file = match self.models.get(&plant) {
                    Some(Some(file)) => file.as_str(),
                    Some(None) => return None,
                    None => plant.model_file_name(),
                };
                Some((plant, self.models_dir.join(file)))
            })
            .collect()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))
    }
}
