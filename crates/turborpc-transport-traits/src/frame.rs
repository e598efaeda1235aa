//! Frame types moved by a transport.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Well-known close codes.
///
/// The `1xxx` values follow RFC 6455; the `4xxx` values are application codes used by
/// peers to reject a client outright.
pub mod close_code {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// Endpoint is going away.
    pub const GOING_AWAY: u16 = 1001;
    /// Closed without a close frame (never sent on the wire).
    pub const ABNORMAL: u16 = 1006;
    /// Peer rejected the client for violating its policy.
    pub const POLICY_VIOLATION: u16 = 1008;
    /// Peer rejected the client's credentials.
    pub const UNAUTHORIZED: u16 = 4001;
    /// Peer refuses to serve this client.
    pub const FORBIDDEN: u16 = 4003;
}

/// Close code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReason {
    /// Numeric close code.
    pub code: u16,
    /// Human-readable reason, possibly empty.
    pub reason: String,
}

impl CloseReason {
    /// Create a close reason.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// A normal closure with no reason text.
    pub fn normal() -> Self {
        Self::new(close_code::NORMAL, "")
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}

/// A single message unit on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Bytes),
    /// Close frame, optionally carrying a code and reason.
    Close(Option<CloseReason>),
}

impl Frame {
    /// Create a text frame.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Payload size in bytes (zero for close frames).
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
            Self::Close(_) => 0,
        }
    }

    /// Returns `true` if the frame carries no payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for close frames.
    pub const fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Payload bytes of a data frame; `None` for close frames.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Binary(data) => Some(data),
            Self::Close(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(Frame::text("hello").len(), 5);
        assert_eq!(Frame::Binary(Bytes::from_static(b"abc")).len(), 3);
        assert!(Frame::Close(None).is_empty());
        assert!(Frame::Close(None).is_close());
    }

    #[test]
    fn test_frame_bytes() {
        assert_eq!(Frame::text("{}").as_bytes(), Some(&b"{}"[..]));
        assert_eq!(Frame::Close(Some(CloseReason::normal())).as_bytes(), None);
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::normal().to_string(), "1000");
        assert_eq!(
            CloseReason::new(close_code::POLICY_VIOLATION, "banned").to_string(),
            "1008 (banned)"
        );
    }
}
