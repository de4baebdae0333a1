use shared::proto::predictor_client::PredictorClient;
use shared::{PlantType, PredictorReply, PredictorRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tonic::Code;
use tonic::transport::{Channel, Endpoint};

use crate::config::ClientConfig;
use crate::error::{ClientError, ConnectionErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Opens the transport channel for a [`PredictionClient`].
#[tonic::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, endpoint: Endpoint) -> Result<Channel, tonic::transport::Error>;
}

/// Plain TCP (h2c) connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[tonic::async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: Endpoint) -> Result<Channel, tonic::transport::Error> {
        endpoint.connect().await
    }
}

/// The cached channel and the outcome of the latest connect attempt.
struct Connection {
    client: Option<PredictorClient<Channel>>,
    /// Bumped on every successful connect.
    generation: u64,
    last_failure: Option<ClientError>,
}

/// Shared connection to the prediction server.
///
/// The channel is opened on first use and reopened lazily after it is
/// dropped. Callers that queue behind a connect attempt share its outcome,
/// so one attempt runs at a time and the connect phase of any call is
/// bounded by the configured timeout. Each call is bounded by the same
/// timeout. Failed calls are never retried.
pub struct PredictionClient<C: Connector = TcpConnector> {
    endpoint: Endpoint,
    address: String,
    timeout: Duration,
    connector: C,
    connection: Mutex<Connection>,
    /// Number of finished connect attempts.
    attempts: AtomicU64,
    state: StdMutex<ConnectionState>,
}

impl PredictionClient<TcpConnector> {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> PredictionClient<C> {
    pub fn with_connector(config: &ClientConfig, connector: C) -> Result<Self, ClientError> {
        let uri = config.endpoint_uri();
        let endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|_| ClientError::InvalidAddress(uri))?
            .connect_timeout(config.timeout);

        Ok(Self {
            endpoint,
            address: config.address(),
            timeout: config.timeout,
            connector,
            connection: Mutex::new(Connection {
                client: None,
                generation: 0,
                last_failure: None,
            }),
            attempts: AtomicU64::new(0),
            state: StdMutex::new(ConnectionState::Disconnected),
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Opens the channel if it is not open yet.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.ensure_connected().await.map(|_| ())
    }

    /// Classifies `images` with the model for `plant`.
    ///
    /// The reply is index-aligned with `images`.
    pub async fn predict(
        &self,
        images: Vec<Vec<u8>>,
        plant: PlantType,
    ) -> Result<PredictorReply, ClientError> {
        let (mut client, generation) = self.ensure_connected().await?;

        let sent = images.len();
        let request = PredictorRequest {
            plant: plant.into(),
            image_data: images,
        };
        log::info!("Sending {} images for {} to {}", sent, plant, self.address);

        let reply = match tokio::time::timeout(self.timeout, client.predict(request)).await {
            Ok(Ok(response)) => response.into_inner(),
            Ok(Err(status)) => {
                log::error!(
                    "Predict failed: {} ({:?}): {}",
                    ConnectionErrorKind::from(status.code()),
                    status.code(),
                    status.message()
                );
                if status.code() == Code::Unavailable {
                    self.drop_channel(Some(generation)).await;
                }
                return Err(ClientError::from_status(&status));
            }
            Err(_) => {
                log::error!("Predict to {} exceeded {:?}", self.address, self.timeout);
                return Err(ClientError::Connection {
                    kind: ConnectionErrorKind::DeadlineExceeded,
                    details: format!("no reply within {:?}", self.timeout),
                });
            }
        };

        let received = reply.result.len();
        if received != sent {
            log::warn!("Server returned {} results for {} images", received, sent);
            return Err(if received == 0 {
                ClientError::EmptyReply
            } else {
                ClientError::MisalignedReply { sent, received }
            });
        }
        Ok(reply)
    }

    /// Drops the channel. Safe to call when already closed.
    pub async fn close(&self) {
        if self.drop_channel(None).await {
            log::info!("Closed connection to {}", self.address);
        }
    }

    /// Returns the open channel and its generation, connecting if needed.
    async fn ensure_connected(&self) -> Result<(PredictorClient<Channel>, u64), ClientError> {
        let deadline = Instant::now() + self.timeout;
        let seen = self.attempts.load(Ordering::Acquire);

        let mut connection = tokio::time::timeout_at(deadline, self.connection.lock())
            .await
            .map_err(|_| self.timed_out())?;

        if let Some(client) = &connection.client {
            return Ok((client.clone(), connection.generation));
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(failure) = &connection.last_failure {
                return Err(failure.clone());
            }
        }

        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to prediction server at {}", self.address);

        let connecting = self.connector.connect(self.endpoint.clone());
        let outcome = match tokio::time::timeout_at(deadline, connecting).await {
            Ok(Ok(opened)) => {
                let client = PredictorClient::new(opened);
                connection.generation += 1;
                connection.client = Some(client.clone());
                connection.last_failure = None;
                self.set_state(ConnectionState::Connected);
                log::info!("Connected to {}", self.address);
                Ok((client, connection.generation))
            }
            Ok(Err(e)) => {
                log::error!("Failed to connect to {}: {}", self.address, e);
                Err(ClientError::Connection {
                    kind: ConnectionErrorKind::Transport,
                    details: e.to_string(),
                })
            }
            Err(_) => {
                log::error!("Connecting to {} timed out after {:?}", self.address, self.timeout);
                Err(self.timed_out())
            }
        };

        if let Err(failure) = &outcome {
            self.set_state(ConnectionState::Disconnected);
            connection.last_failure = Some(failure.clone());
        }
        self.attempts.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Drops the cached channel, or only the given generation of it.
    async fn drop_channel(&self, generation: Option<u64>) -> bool {
        let mut connection = self.connection.lock().await;
        if generation.is_some_and(|g| g != connection.generation) {
            return false;
        }
        let dropped = connection.client.take().is_some();
        self.set_state(ConnectionState::Disconnected);
        dropped
    }

    fn timed_out(&self) -> ClientError {
        ClientError::ConnectionTimeout {
            address: self.address.clone(),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
