//! The outcome delivered to a correlated request.

use turborpc_types::Envelope;

/// Result of a correlated request.
///
/// A successful reply carries the response envelope. A failed reply carries nothing: the
/// request timed out, the transport closed while it was pending, or it could not be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The response, present only on success.
    pub envelope: Option<Envelope>,
    /// Whether a response arrived.
    pub success: bool,
}

impl Reply {
    /// A reply carrying a response.
    pub fn success(envelope: Envelope) -> Self {
        Self {
            envelope: Some(envelope),
            success: true,
        }
    }

    /// A reply for a request that got no response.
    pub fn failure() -> Self {
        Self {
            envelope: None,
            success: false,
        }
    }

    /// Returns `true` if a response arrived.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Take the response envelope.
    pub fn into_envelope(self) -> Option<Envelope> {
        self.envelope
    }
}
