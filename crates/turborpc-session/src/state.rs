//! Public session states.

use std::fmt;
use std::time::Duration;

/// Where a session is in its connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A connect attempt is in flight.
    Connecting,
    /// The transport is open; requests can be sent.
    Open,
    /// The transport closed and a reconnect is scheduled.
    Backoff {
        /// Reconnect attempt number, starting at 1.
        attempt: u32,
        /// Delay before the attempt starts.
        delay: Duration,
    },
    /// The session will not connect again.
    Terminated(TerminalReason),
}

impl SessionState {
    /// Returns `true` when the transport is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` once the session has stopped for good.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Backoff { attempt, delay } => {
                write!(f, "backoff (attempt {attempt}, delay {delay:?})")
            }
            Self::Terminated(reason) => write!(f, "terminated: {reason}"),
        }
    }
}

/// Why a session stopped connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// [`Session::close`](crate::Session::close) was called.
    ManualClose,
    /// The peer closed with one of the configured terminal close codes.
    PeerRejected {
        /// Close code sent by the peer.
        code: u16,
    },
    /// The reconnect budget ran out.
    RetriesExhausted {
        /// Reconnect attempts made since the last successful open.
        attempts: u32,
    },
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualClose => write!(f, "closed by caller"),
            Self::PeerRejected { code } => write!(f, "rejected by peer (close code {code})"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "gave up after {attempts} reconnect attempts")
            }
        }
    }
}
