//! Request, reply and error types shared by the multimeter logger and its transports.

pub mod error;
pub mod scpi;

pub use crate::error::{Error, ProtocolError, TransportError};
pub use crate::scpi::{ScpiRequest, ScpiResponse};

pub type Result<T> = std::result::Result<T, Error>;
