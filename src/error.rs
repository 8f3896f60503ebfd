use crate::model::ProtocolVersion;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{host} resolved to no addresses")]
    NoAddress { host: String },

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("attempt exceeded its {0:?} deadline")]
    Deadline(Duration),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("{0} cannot be expressed by the local TLS library")]
    Unavailable(ProtocolVersion),

    #[error("TLS setup failed: {0}")]
    Setup(#[from] openssl::error::ErrorStack),
}

impl ProbeError {
    pub fn stage(&self) -> &'static str {
        match self {
            ProbeError::Resolution { .. } | ProbeError::NoAddress { .. } => "resolve",
            ProbeError::Connect(_) | ProbeError::ConnectTimeout(_) => "connect",
            ProbeError::HandshakeTimeout(_) | ProbeError::Handshake(_) => "handshake",
            ProbeError::Deadline(_) => "deadline",
            ProbeError::Unavailable(_) | ProbeError::Setup(_) => "setup",
        }
    }
}

impl From<openssl::ssl::Error> for ProbeError {
    fn from(err: openssl::ssl::Error) -> Self {
        ProbeError::Handshake(err.to_string())
    }
}
