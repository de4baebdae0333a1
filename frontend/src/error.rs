use std::fmt;

/// Failure category of a prediction call, independent of the transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    Transport,
    InvalidArgument,
    DeadlineExceeded,
    Unavailable,
    Internal,
    Unknown,
}

impl From<tonic::Code> for ConnectionErrorKind {
    fn from(code: tonic::Code) -> Self {
        match code {
            tonic::Code::InvalidArgument => Self::InvalidArgument,
            tonic::Code::DeadlineExceeded => Self::DeadlineExceeded,
            tonic::Code::Unavailable => Self::Unavailable,
            tonic::Code::Internal => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "Connection failed",
            Self::InvalidArgument => "Invalid argument",
            Self::DeadlineExceeded => "Request timeout",
            Self::Unavailable => "Service unavailable",
            Self::Internal => "Internal server error",
            Self::Unknown => "Unknown error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server address {0}")]
    InvalidAddress(String),
    #[error("timed out connecting to {address}")]
    ConnectionTimeout { address: String },
    #[error("{kind}: {details}")]
    Connection {
        kind: ConnectionErrorKind,
        details: String,
    },
    #[error("server returned no results")]
    EmptyReply,
    #[error("server returned {received} results for {sent} images")]
    MisalignedReply { sent: usize, received: usize },
    #[error("unknown plant {0:?}")]
    UnknownPlant(String),
}

impl ClientError {
    pub(crate) fn from_status(status: &tonic::Status) -> Self {
        Self::Connection {
            kind: status.code().into(),
            details: status.message().to_string(),
        }
    }

    pub fn kind(&self) -> Option<ConnectionErrorKind> {
        match self {
            Self::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Text shown to the end user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAddress(_) | Self::ConnectionTimeout { .. } => {
                "The prediction server is not reachable right now. Please try again later.".to_string()
            }
            Self::Connection { kind, .. } => match kind {
                ConnectionErrorKind::InvalidArgument => {
                    "This plant type is not supported yet.".to_string()
                }
                ConnectionErrorKind::DeadlineExceeded => {
                    "The analysis took too long. Please try again.".to_string()
                }
                ConnectionErrorKind::Transport | ConnectionErrorKind::Unavailable => {
                    "The prediction server is not reachable right now. Please try again later.".to_string()
                }
                ConnectionErrorKind::Internal => {
                    "Could not analyze the photos. Please send clearer images of the leaves.".to_string()
                }
                ConnectionErrorKind::Unknown => {
                    "Something went wrong while analyzing the photos.".to_string()
                }
            },
            Self::EmptyReply => "The server did not return any results.".to_string(),
            Self::MisalignedReply { .. } => {
                "The server returned incomplete results. Please send the photos again.".to_string()
            }
            Self::UnknownPlant(name) => format!("Unknown plant: {name}."),
        }
    }
}
