//! Error types for vswitch-rs

use thiserror::Error;

/// Result type alias for vswitch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vswitch-rs
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Packet capture error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Invalid configuration requested through the CLI
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bridge startup error
    #[error("Startup error: {0}")]
    Startup(String),
}

impl Error {
    /// Create a capture error with a custom message
    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Error::Capture(msg.into())
    }

    /// Create an interface error with a custom message
    pub fn interface<S: Into<String>>(msg: S) -> Self {
        Error::Interface(msg.into())
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
