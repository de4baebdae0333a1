use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 50052;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DISEASES_DB: &str = "data/diseases_db.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub diseases_db: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            diseases_db: PathBuf::from(DEFAULT_DISEASES_DB),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("GRPC_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("GRPC_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "GRPC_PORT",
                value: port,
            })?;
        }
        if let Some(secs) = lookup("GRPC_TIMEOUT_SECS") {
            config.timeout = match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "GRPC_TIMEOUT_SECS",
                        value: secs,
                    });
                }
            };
        }
        if let Some(path) = lookup("DISEASES_DB") {
            config.diseases_db = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint_uri(&self) -> String {
        format!("http://{}", self.address())
    }
}
