//! Error types for Kraken

use thiserror::Error;

/// Result type alias for Kraken operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Kraken
#[derive(Error, Debug)]
pub enum Error {
    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Send or receive on a connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Frame construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Frame parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Optional capability not provided by a connection
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),
}

impl Error {
    /// Create a transport error with a custom message
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::Transport(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = Error::invalid_parameter("flood_ms", "expected an integer");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'flood_ms': expected an integer"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow link");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
