//! Transport error types.

use std::time::Duration;
use thiserror::Error;

use crate::config::LimitsConfig;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during transport operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish a connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An established connection was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Failed to send a frame.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Connection establishment timed out.
    #[error("Connection to {address} timed out after {timeout:?}")]
    ConnectionTimeout {
        /// The address that was being dialed
        address: String,
        /// The timeout duration that was exceeded
        timeout: Duration,
    },

    /// The transport was configured with invalid parameters.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Outbound frame size exceeds the configured maximum limit.
    #[error(
        "Outbound frame ({size} bytes) exceeds maximum allowed ({max} bytes). \
         If this is expected, raise `LimitsConfig::max_outbound_size`"
    )]
    FrameTooLarge {
        /// The actual size of the frame in bytes
        size: usize,
        /// The maximum allowed size in bytes
        max: usize,
    },

    /// Inbound frame size exceeds the configured maximum limit.
    #[error(
        "Inbound frame ({size} bytes) exceeds maximum allowed ({max} bytes). \
         If this is expected, raise `LimitsConfig::max_inbound_size`"
    )]
    InboundTooLarge {
        /// The actual size of the frame in bytes
        size: usize,
        /// The maximum allowed size in bytes
        max: usize,
    },
}

/// Validates that an outbound frame does not exceed the configured limit.
///
/// Returns `Ok(())` if the size is within limits or no limit is set, otherwise
/// `Err(TransportError::FrameTooLarge)`.
pub fn validate_outbound_size(size: usize, limits: &LimitsConfig) -> TransportResult<()> {
    if let Some(max) = limits.max_outbound_size
        && size > max
    {
        return Err(TransportError::FrameTooLarge { size, max });
    }
    Ok(())
}

/// Validates that an inbound frame does not exceed the configured limit.
///
/// Returns `Ok(())` if the size is within limits or no limit is set, otherwise
/// `Err(TransportError::InboundTooLarge)`.
pub fn validate_inbound_size(size: usize, limits: &LimitsConfig) -> TransportResult<()> {
    if let Some(max) = limits.max_inbound_size
        && size > max
    {
        return Err(TransportError::InboundTooLarge { size, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_size_validation() {
        let limits = LimitsConfig::default();
        assert!(validate_outbound_size(1000, &limits).is_ok());
        assert_eq!(
            validate_outbound_size(17 * 1024 * 1024, &limits),
            Err(TransportError::FrameTooLarge {
                size: 17 * 1024 * 1024,
                max: 16 * 1024 * 1024,
            })
        );
    }

    #[test]
    fn test_inbound_size_validation() {
        let limits = LimitsConfig::with_max_size(64);
        assert!(validate_inbound_size(64, &limits).is_ok());
        assert!(matches!(
            validate_inbound_size(65, &limits),
            Err(TransportError::InboundTooLarge { size: 65, max: 64 })
        ));
    }

    #[test]
    fn test_unlimited_config() {
        let limits = LimitsConfig::unlimited();
        assert!(validate_outbound_size(100 * 1024 * 1024, &limits).is_ok());
        assert!(validate_inbound_size(100 * 1024 * 1024, &limits).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::ConnectionTimeout {
            address: "ws://localhost:1".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(
            err.to_string(),
            "Connection to ws://localhost:1 timed out after 2s"
        );
    }
}
