//! # Error Types
//!
//! Custom error types for the CRSF → MAVLink bridge using `thiserror`.

use thiserror::Error;

/// Main error type for the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// CRSF protocol errors (framing, CRC, short payloads)
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// MAVLink serialization errors
    #[error("MAVLink encode error: {0}")]
    MavlinkEncode(String),
}

/// Result type alias for the bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
