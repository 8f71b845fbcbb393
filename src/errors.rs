// src/errors.rs

//! Defines the primary error type for the crate.

use thiserror::Error;

/// The main error enum, representing all possible failures within the client.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum PeridotError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Connect timed out")]
    ConnectTimeout,

    #[error("Connection is already established or in progress")]
    AlreadyConnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A reply was decoded while no command was outstanding. This signals a
    /// broken command/reply pairing and is never recoverable.
    #[error("Reply arrived with no matching queued command")]
    QueueUnderflow,

    #[error("Reply arrived in invalid connection state: {0}")]
    InvalidState(String),

    #[error("Connection handler is no longer running")]
    HandlerClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for PeridotError {
    fn from(e: toml::de::Error) -> Self {
        PeridotError::Config(e.to_string())
    }
}
