//! Core transport traits.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::{Sink, Stream};

use crate::error::{TransportError, TransportResult};
use crate::frame::Frame;
use crate::types::TransportType;

/// Write half of an open connection.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = TransportError> + Send>>;

/// Read half of an open connection.
///
/// The stream ends (`None`) when the peer goes away without a close frame.
pub type FrameStream = Pin<Box<dyn Stream<Item = TransportResult<Frame>> + Send>>;

/// Future returned by [`Connector::connect`].
pub type ConnectFuture = Pin<Box<dyn Future<Output = TransportResult<Connection>> + Send>>;

/// One physical, already-open connection.
///
/// A connection is used once: when either half fails or closes, the owner drops it and
/// asks the [`Connector`] for a new one.
pub struct Connection {
    /// Outbound frames.
    pub sink: FrameSink,
    /// Inbound frames.
    pub stream: FrameStream,
    /// Address this connection was opened against.
    pub endpoint: String,
}

impl Connection {
    /// Bundle the two halves of an open connection.
    pub fn new(sink: FrameSink, stream: FrameStream, endpoint: impl Into<String>) -> Self {
        Self {
            sink,
            stream,
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Opens connections of one transport type.
///
/// The returned future must not borrow the connector so it can be driven from a spawned
/// task; implementations clone whatever they need into it.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Returns the type of transport this connector opens.
    fn transport_type(&self) -> TransportType;

    /// Opens a new connection to `address`.
    fn connect(&self, address: &str) -> ConnectFuture;
}
