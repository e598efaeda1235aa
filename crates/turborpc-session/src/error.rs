//! Session error types.

use thiserror::Error;
use turborpc_transport_traits::TransportError;
use turborpc_types::EnvelopeError;

use crate::state::TerminalReason;

/// A specialized `Result` type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors returned by session operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// The session has no open transport right now.
    #[error("Session is not connected")]
    NotConnected,

    /// The session's background task has exited; the handle is dead.
    #[error("Session is closed")]
    Closed,

    /// The session stopped connecting for good.
    #[error("Session terminated: {0}")]
    Terminated(TerminalReason),

    /// An envelope could not be encoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The transport rejected a frame.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Returns `true` if retrying later on the same handle may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}
