//! The public session handle.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, oneshot, watch};
use turborpc_transport_traits::Connector;
use turborpc_types::Envelope;

use crate::actor::{self, ActorSetup, Command};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::handler::SessionHandler;
use crate::pending::ReplyHandler;
use crate::reply::Reply;
use crate::state::SessionState;
use crate::stats::SessionStats;

/// A request/response session over one logical connection.
///
/// `Session` is a cheap handle: clones share the same background task, transport,
/// pending-request table and timers. The task owns all state; every operation here is a
/// message to it and is safe to call at any time, including while the session is
/// reconnecting (sends then fail immediately; nothing is queued).
///
/// The background task exits after [`close`](Self::close), or once every handle has been
/// dropped.
#[derive(Clone)]
pub struct Session {
    identity: Arc<str>,
    address: Arc<str>,
    config: Arc<SessionConfig>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    stats: Arc<RwLock<SessionStats>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("address", &self.address)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session and start connecting to `address` immediately.
    ///
    /// `config` is clamped into its supported ranges and frozen for the life of the
    /// session.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect(
        identity: impl Into<String>,
        address: impl Into<String>,
        connector: Arc<dyn Connector>,
        handler: Arc<dyn SessionHandler>,
        config: SessionConfig,
    ) -> Self {
        let identity: Arc<str> = identity.into().into();
        let address: Arc<str> = address.into().into();
        let config = Arc::new(config.resolved());
        let stats = Arc::new(RwLock::new(SessionStats::new()));
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SessionState::Connecting);

        actor::spawn(
            ActorSetup {
                identity: identity.clone(),
                address: address.clone(),
                connector,
                handler,
                config: config.clone(),
                stats: stats.clone(),
            },
            commands_rx,
            state_tx,
        );

        Self {
            identity,
            address,
            config,
            commands,
            state,
            stats,
        }
    }

    /// Send an envelope without waiting for a response.
    ///
    /// If the transport is not open the envelope is dropped and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session's task has exited.
    pub fn send(&self, envelope: Envelope) -> SessionResult<()> {
        self.commands
            .send(Command::Send(envelope))
            .map_err(|_| SessionError::Closed)
    }

    /// Send an envelope and wait for the response carrying the same correlation id.
    ///
    /// Resolves with a successful [`Reply`] when the response arrives, or with a failed
    /// one if the request expires or the transport closes first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] if the transport is not open, and
    /// [`SessionError::Closed`] if the session's task has exited.
    pub async fn request(&self, envelope: Envelope) -> SessionResult<Reply> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Request {
                envelope,
                reply: ReplyHandler::Channel(tx),
            })
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Send an envelope and hand the outcome to `callback`.
    ///
    /// The callback runs exactly once, on the session's task. If the transport is not
    /// open, or the session is gone, it receives a failed [`Reply`].
    pub fn request_with<F>(&self, envelope: Envelope, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        let command = Command::Request {
            envelope,
            reply: ReplyHandler::Callback(Box::new(callback)),
        };
        if let Err(SendError(Command::Request { reply, .. })) = self.commands.send(command) {
            reply.resolve(Reply::failure());
        }
    }

    /// Close the session for good.
    ///
    /// Pending requests fail, the transport gets a normal close frame and no reconnect
    /// is attempted. Calling it again is a no-op.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Wait until the session's task has exited.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }

    /// Name passed to the connection handler.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Address the session connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The resolved configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns `true` while the transport is open.
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    /// Subscribe to lifecycle state changes.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the transport is open.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Terminated`] if the session stops connecting first, and
    /// [`SessionError::Closed`] if its task exits.
    pub async fn wait_until_open(&self) -> SessionResult<()> {
        let mut states = self.state.clone();
        let state = states
            .wait_for(|state| state.is_open() || state.is_terminated())
            .await
            .map_err(|_| SessionError::Closed)?
            .clone();

        match state {
            SessionState::Terminated(reason) => Err(SessionError::Terminated(reason)),
            _ => Ok(()),
        }
    }

    /// Snapshot of the session's counters.
    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }
}
