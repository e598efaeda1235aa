//! Envelope codec errors.

use thiserror::Error;

/// Result alias for envelope encoding and decoding.
pub type EnvelopeResult<T> = std::result::Result<T, EnvelopeError>;

/// Errors raised while encoding or decoding an [`Envelope`](crate::Envelope).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EnvelopeError {
    /// The input was not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope could not be serialized.
    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}
