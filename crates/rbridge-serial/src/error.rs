//! Error types for transport and link operations

use rbridge_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the transport, the link and the device surface
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Protocol-level failure (codec, framing, batch)
    #[error(transparent)]
    Protocol(#[from] CoreError),

    /// A request was submitted while another is still pending
    ///
    /// Caller-discipline violation: the link carries at most one
    /// request at a time.
    #[error("a request is already in flight")]
    RequestInFlight,

    /// Response awaited with no request pending
    #[error("no request in flight")]
    NoRequestInFlight,

    /// The link was closed by an earlier fatal error
    #[error("link is closed")]
    LinkClosed,

    /// Device or link failure, fatal - the link closes and is not
    /// retried by the core
    #[error("transport error: {0}")]
    Transport(String),

    /// No complete response within the configured timeout
    #[error("response timeout")]
    Timeout,

    /// Failed to establish the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type alias for transport and link operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Transport(e.to_string())
    }
}
