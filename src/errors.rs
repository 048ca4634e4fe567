use thiserror::Error;

use crate::connection::ConnectionStatus;

/// Failure raised by [`Connection::connect`](crate::Connection::connect).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not connect to drone: {reason}")]
pub struct ConnectError {
    pub reason: String,
}

impl ConnectError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Failure raised by [`Connection::send`](crate::Connection::send).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{msg}")]
pub struct TransportError {
    pub msg: String,
}

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Failure returned by a telemetry listener. It is isolated by the bus and
/// never reaches the event source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("listener fault: {msg}")]
pub struct ListenerFault {
    pub msg: String,
}

impl ListenerFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DroneError {
    #[error("connection unavailable ({status})")]
    ConnectionUnavailable { status: ConnectionStatus },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid {what} `{value}`, expected {expected}")]
    Validation { what: &'static str, value: String, expected: &'static str },
}

impl DroneError {
    pub(crate) fn validation(what: &'static str, value: impl ToString, expected: &'static str) -> Self {
        DroneError::Validation { what, value: value.to_string(), expected }
    }

    /// `true` for input rejected before anything was dispatched.
    pub fn is_validation(&self) -> bool {
        matches!(self, DroneError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, DroneError>;
