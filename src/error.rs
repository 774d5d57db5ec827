use crate::{link::Link, network::SocketError, v4::OptionCode};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DhcpError {
    #[error("Socket operation failed")]
    Socket(#[from] SocketError),

    #[error("option {0} not present")]
    OptionNotPresent(OptionCode),

    #[error("invalid options")]
    InvalidOptions,

    #[error("option {code} has invalid length {len}")]
    InvalidOptionValue { code: OptionCode, len: usize },

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("failed to encode packet: {0}")]
    Encoding(String),

    #[error("error writing packet to connection")]
    Write(#[source] io::Error),

    #[error("error reading from UDP connection")]
    Read(#[source] io::Error),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("operation canceled")]
    Canceled,

    #[error("got no valid responses")]
    NoResponse,

    #[error("Failed to parse MAC address: {0}")]
    MacParse(String),

    #[error("Interface '{0}' not found or has no MAC address")]
    InterfaceInvalid(String),
}

/// An error that occurred on the associated link.
#[derive(Error, Debug)]
#[error("error on {:?}: {}", .link.name(), .source)]
pub struct ClientError {
    pub link: Link,
    pub source: DhcpError,
}

impl ClientError {
    pub fn new(link: Link, source: DhcpError) -> Self {
        Self { link, source }
    }

    /// Whether the underlying failure is a per-attempt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.source, DhcpError::DeadlineExceeded)
    }
}
