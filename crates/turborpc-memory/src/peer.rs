//! The server-side end of a memory connection.

use futures::StreamExt as _;
use futures::channel::mpsc;
use turborpc_transport_traits::{CloseReason, Frame, TransportError, TransportResult};

/// Far end of one in-process connection.
///
/// Dropping the peer ends the client's inbound stream without a close frame, which is
/// what an abrupt network loss looks like to the session.
#[derive(Debug)]
pub struct MemoryPeer {
    address: String,
    outbound: mpsc::UnboundedSender<Frame>,
    inbound: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryPeer {
    pub(crate) fn new(
        address: String,
        outbound: mpsc::UnboundedSender<Frame>,
        inbound: mpsc::UnboundedReceiver<Frame>,
    ) -> Self {
        Self {
            address,
            outbound,
            inbound,
        }
    }

    /// Address the client dialed.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Next frame written by the client.
    ///
    /// Returns `None` when the client dropped its side of the connection.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.next().await
    }

    /// Next text frame written by the client, skipping any other frame kind.
    ///
    /// Returns `None` when the client closed or dropped the connection.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.recv().await? {
                Frame::Text(text) => return Some(text),
                Frame::Close(_) => return None,
                Frame::Binary(_) => {}
            }
        }
    }

    /// Write a frame to the client.
    pub fn send(&self, frame: Frame) -> TransportResult<()> {
        self.outbound
            .unbounded_send(frame)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Write a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) -> TransportResult<()> {
        self.send(Frame::text(text))
    }

    /// Send a close frame and drop the connection.
    pub fn close(self, code: u16, reason: &str) {
        let _ = self.send(Frame::Close(Some(CloseReason::new(code, reason))));
    }

    /// Returns `true` once the client has dropped its outbound half.
    pub fn is_client_gone(&self) -> bool {
        self.outbound.is_closed()
    }
}
