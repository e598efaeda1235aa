//! Session event handlers.

use tracing::{debug, info};
use turborpc_types::Envelope;

/// Receives lifecycle and push notifications from a session.
///
/// Both methods run on the session's task. They must return quickly and must not block;
/// hand heavy work off to another task.
pub trait SessionHandler: Send + Sync {
    /// Called with `true` when a transport opens and `false` on every close, including
    /// failed connect attempts.
    fn on_connection_change(&self, identity: &str, connected: bool);

    /// Called for every inbound envelope except heartbeat answers, before any pending
    /// request it correlates with is resolved.
    fn on_message(&self, envelope: &Envelope);
}

/// Handler that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl SessionHandler for NoopHandler {
    fn on_connection_change(&self, _identity: &str, _connected: bool) {}

    fn on_message(&self, _envelope: &Envelope) {}
}

/// Handler that logs every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

impl SessionHandler for TracingHandler {
    fn on_connection_change(&self, identity: &str, connected: bool) {
        if connected {
            info!("Session {} connected", identity);
        } else {
            info!("Session {} disconnected", identity);
        }
    }

    fn on_message(&self, envelope: &Envelope) {
        debug!(
            "Received {} (uuid {}, status {})",
            envelope.route, envelope.uuid, envelope.status
        );
    }
}
