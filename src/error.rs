//! Error types for MUX client operations
//!
//! Attempt-level failures (transport faults, timeouts, bad status, empty or
//! malformed bodies) are all retryable. Once the attempt bound is exhausted
//! the client wraps the last of them in [`MuxError::DeviceUnreachable`].

use std::time::Duration;

use thiserror::Error;

/// Result type for MUX operations
pub type MuxResult<T> = Result<T, MuxError>;

/// Errors produced by the MUX client
#[derive(Debug, Error)]
pub enum MuxError {
    /// Transport-level fault (connection refused, reset, DNS, ...)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A single attempt exceeded its timeout
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The device closed the connection before a response was read
    #[error("Connection closed by device: {message}")]
    ConnectionClosed { message: String },

    /// The device answered with a status other than 200
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    /// The device answered 200 with an empty body
    #[error("Empty response from device")]
    EmptyResponse,

    /// The response body is not well-formed XML
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Every attempt failed; carries the last failure
    #[error("Device unreachable after {attempts} attempts: {source}")]
    DeviceUnreachable {
        attempts: u32,
        #[source]
        source: Box<MuxError>,
    },

    /// A data operation was issued while no device session is established
    #[error("Connection to device not established")]
    NotConnected,

    /// Invalid client configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A property value could not be interpreted
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl MuxError {
    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Create a connection-closed error
    pub fn connection_closed<S: Into<String>>(message: S) -> Self {
        Self::ConnectionClosed {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a device unreachable error wrapping the last attempt failure
    pub fn unreachable(attempts: u32, last: MuxError) -> Self {
        Self::DeviceUnreachable {
            attempts,
            source: Box::new(last),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether a single failed attempt with this error may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::ConnectionClosed { .. }
                | Self::HttpStatus { .. }
                | Self::EmptyResponse
                | Self::MalformedResponse { .. }
        )
    }

    /// Whether the device dropped the connection after accepting a command
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed { .. })
    }

    /// Whether this error means the device could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::DeviceUnreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_retryable_classification() {
        assert!(MuxError::transport("refused").is_retryable());
        assert!(MuxError::timeout(Duration::from_secs(5)).is_retryable());
        assert!(MuxError::EmptyResponse.is_retryable());
        assert!(MuxError::HttpStatus { status: 503 }.is_retryable());
        assert!(MuxError::malformed("eof").is_retryable());

        assert!(!MuxError::configuration("no host").is_retryable());
        assert!(!MuxError::NotConnected.is_retryable());
        assert!(!MuxError::unreachable(5, MuxError::EmptyResponse).is_retryable());
    }

    #[test]
    fn test_unreachable_keeps_last_cause() {
        let err = MuxError::unreachable(5, MuxError::transport("connection reset"));

        assert!(err.is_unreachable());
        assert_eq!(
            err.to_string(),
            "Device unreachable after 5 attempts: Transport error: connection reset"
        );

        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Transport error: connection reset"));
    }

    #[test]
    fn test_connection_closed() {
        let err = MuxError::connection_closed("peer closed");
        assert!(err.is_connection_closed());
        assert!(!MuxError::EmptyResponse.is_connection_closed());
    }
}
