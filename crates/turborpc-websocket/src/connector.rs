//! WebSocket connector.

use futures::{SinkExt as _, StreamExt as _, future};
use tokio_tungstenite::connect_async_with_config;
use tracing::{debug, info};
use turborpc_transport_traits::{
    ConnectFuture, Connection, Connector, Frame, TransportError, TransportResult, TransportType,
};
use url::Url;

use crate::codec::{from_message, to_message};

/// Opens WebSocket client connections.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    /// Disable Nagle's algorithm on the underlying TCP socket
    nodelay: bool,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self { nodelay: true }
    }
}

impl WebSocketConnector {
    /// Create a connector with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether small frames are flushed immediately
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

/// Check that `address` is a `ws://` or `wss://` URL.
pub fn validate_address(address: &str) -> TransportResult<Url> {
    let url = Url::parse(address).map_err(|e| {
        TransportError::ConfigurationError(format!("Invalid WebSocket URL {address}: {e}"))
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::ConfigurationError(format!(
            "Unsupported scheme {other} in {address}, expected ws or wss"
        ))),
    }
}

impl Connector for WebSocketConnector {
    fn transport_type(&self) -> TransportType {
        TransportType::WebSocket
    }

    fn connect(&self, address: &str) -> ConnectFuture {
        let address = address.to_string();
        let nodelay = self.nodelay;

        Box::pin(async move {
            validate_address(&address)?;
            info!("Connecting to WebSocket server at {}", address);

            let (stream, response) = connect_async_with_config(address.as_str(), None, nodelay)
                .await
                .map_err(|e| {
                    TransportError::ConnectionFailed(format!("WebSocket connection failed: {e}"))
                })?;
            debug!(
                "WebSocket handshake with {} completed ({})",
                address,
                response.status()
            );

            let (writer, reader) = stream.split();
            let sink = writer
                .sink_map_err(|e| TransportError::SendFailed(e.to_string()))
                .with(|frame: Frame| future::ready(Ok::<_, TransportError>(to_message(frame))));
            let stream = reader.filter_map(|item| future::ready(from_message(item)));

            Ok(Connection::new(Box::pin(sink), Box::pin(stream), address))
        })
    }
}
