//! Connector and listener halves of the memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::channel::mpsc;
use futures::{SinkExt as _, StreamExt as _};
use parking_lot::Mutex;
use tracing::{debug, trace};
use turborpc_transport_traits::{
    ConnectFuture, Connection, Connector, Frame, TransportError, TransportType,
};

use crate::peer::MemoryPeer;

/// How the connector answers the next connect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectMode {
    /// Open a channel pair and hand the far end to the listener.
    #[default]
    Accept,
    /// Fail immediately with `ConnectionFailed`.
    Refuse,
    /// Never complete; exercises connect timeouts.
    Hang,
}

/// Opens in-process connections.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    mode: Arc<Mutex<ConnectMode>>,
    attempts: Arc<AtomicU64>,
}

/// Receives the far end of every accepted connection.
#[derive(Debug)]
pub struct MemoryListener {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the listener that receives its peers.
    pub fn new() -> (Self, MemoryListener) {
        let (tx, rx) = mpsc::unbounded();
        let connector = Self {
            peers: tx,
            mode: Arc::new(Mutex::new(ConnectMode::Accept)),
            attempts: Arc::new(AtomicU64::new(0)),
        };
        (connector, MemoryListener { peers: rx })
    }

    /// Change how subsequent connect attempts behave.
    pub fn set_mode(&self, mode: ConnectMode) {
        *self.mode.lock() = mode;
    }

    /// Number of connect attempts made so far, successful or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    fn transport_type(&self) -> TransportType {
        TransportType::Memory
    }

    fn connect(&self, address: &str) -> ConnectFuture {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mode = *self.mode.lock();
        let address = address.to_string();
        let peers = self.peers.clone();

        Box::pin(async move {
            match mode {
                ConnectMode::Refuse => {
                    debug!("Memory connect {} to {} refused", attempt, address);
                    return Err(TransportError::ConnectionFailed(format!(
                        "{address} refused the connection"
                    )));
                }
                ConnectMode::Hang => {
                    debug!("Memory connect {} to {} left hanging", attempt, address);
                    futures::future::pending::<()>().await;
                }
                ConnectMode::Accept => {}
            }

            // client -> peer
            let (client_tx, peer_rx) = mpsc::unbounded::<Frame>();
            // peer -> client
            let (peer_tx, client_rx) = mpsc::unbounded::<Frame>();

            let peer = MemoryPeer::new(address.clone(), peer_tx, peer_rx);
            peers.unbounded_send(peer).map_err(|_| {
                TransportError::ConnectionFailed(format!("no listener for {address}"))
            })?;
            trace!("Memory connect {} to {} accepted", attempt, address);

            let sink = client_tx
                .sink_map_err(|e| TransportError::SendFailed(e.to_string()));
            let stream = client_rx.map(Ok);
            Ok(Connection::new(Box::pin(sink), Box::pin(stream), address))
        })
    }
}

impl MemoryListener {
    /// Wait for the next accepted connection.
    ///
    /// Returns `None` once every connector clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.next().await
    }

    /// Take an already accepted connection without waiting.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.peers.try_recv().ok()
    }
}
