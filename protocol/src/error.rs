use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Clone, Debug)]
pub enum TransportError {
    #[error("Other Error: {0}")]
    Other(Arc<anyhow::Error>),
}

impl From<anyhow::Error> for TransportError {
    fn from(x: anyhow::Error) -> Self {
        TransportError::Other(Arc::new(x))
    }
}

#[derive(Error, Clone, Debug)]
pub enum ProtocolError {
    #[error("Timeout")]
    Timeout,
    #[error("Unexpected Response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Transport Error {0}")]
    Transport(TransportError),
    #[error("Protocol Error {0}")]
    Protocol(ProtocolError),
}

impl Error {
    pub fn transport<T: Into<TransportError>>(err: T) -> Self {
        Self::Transport(err.into())
    }

    pub fn protocol_timeout() -> Self {
        Error::Protocol(ProtocolError::Timeout)
    }

    pub fn unexpected_response<T: Into<String>>(reply: T) -> Self {
        Error::Protocol(ProtocolError::UnexpectedResponse(reply.into()))
    }
}
