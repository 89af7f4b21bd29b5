//! RTU Slave Error Types
//!
//! Setup and I/O errors. Protocol exceptions and dropped frames are not
//! errors; they are ordinary outcomes of a poll.

use thiserror::Error;

/// Result type for voltage-rtu-slave operations
pub type Result<T> = std::result::Result<T, RtuError>;

/// RTU slave errors
#[derive(Debug, Error, Clone)]
pub enum RtuError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Direction control (RE/DE line) errors
    #[error("Direction control error: {0}")]
    Direction(String),
}

impl RtuError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a direction control error
    pub fn direction(msg: impl Into<String>) -> Self {
        Self::Direction(msg.into())
    }
}

impl From<std::io::Error> for RtuError {
    fn from(err: std::io::Error) -> Self {
        RtuError::Io(err.to_string())
    }
}

#[cfg(feature = "serial")]
impl From<tokio_serial::Error> for RtuError {
    fn from(err: tokio_serial::Error) -> Self {
        RtuError::Serial(err.to_string())
    }
}
