//! Named sessions sharing one connector and one downstream handler.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};
use turborpc_transport_traits::Connector;
use turborpc_types::Envelope;

use crate::config::SessionConfig;
use crate::handler::SessionHandler;
use crate::session::Session;

struct Entry {
    generation: u64,
    session: Session,
    connected: bool,
}

struct RegistryInner {
    connector: Arc<dyn Connector>,
    handler: Arc<dyn SessionHandler>,
    entries: Mutex<HashMap<String, Entry>>,
    next_generation: AtomicU64,
}

/// Maps names to sessions.
///
/// Every session is created with a handler that remembers the generation it was
/// registered under. Once a name is replaced or removed, notifications from the old
/// session no longer reach the downstream handler, even though the old session may
/// still report its own close.
///
/// Dropping the registry does not close its sessions; call
/// [`close_all`](Self::close_all) first.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connector", &self.inner.connector)
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new(connector: Arc<dyn Connector>, handler: Arc<dyn SessionHandler>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                connector,
                handler,
                entries: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Create a session under `name`, closing any session the name held before.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn add(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
        config: SessionConfig,
    ) -> Session {
        let name = name.into();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let guard = Arc::new(GenerationGuard {
            name: name.clone(),
            generation,
            registry: Arc::downgrade(&self.inner),
        });

        // Connecting only spawns the session task, so holding the lock here is short and
        // guarantees the entry exists before the first notification is checked.
        let (session, previous) = {
            let mut entries = self.inner.entries.lock();
            let session = Session::connect(
                name.clone(),
                address,
                self.inner.connector.clone(),
                guard,
                config,
            );
            let previous = entries.insert(
                name.clone(),
                Entry {
                    generation,
                    session: session.clone(),
                    connected: false,
                },
            );
            (session, previous)
        };

        if let Some(previous) = previous {
            debug!("Replacing session {} (generation {})", name, previous.generation);
            previous.session.close();
        }
        session
    }

    /// Session registered under `name`.
    pub fn get(&self, name: &str) -> Option<Session> {
        self.inner
            .entries
            .lock()
            .get(name)
            .map(|entry| entry.session.clone())
    }

    /// Close and forget the session registered under `name`.
    ///
    /// Returns `false` if no session had that name.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.inner.entries.lock().remove(name);
        match removed {
            Some(entry) => {
                debug!("Removing session {}", name);
                entry.session.close();
                true
            }
            None => false,
        }
    }

    /// Last connection status reported by the session under `name`.
    pub fn is_connected(&self, name: &str) -> Option<bool> {
        self.inner
            .entries
            .lock()
            .get(name)
            .map(|entry| entry.connected)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns `true` if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Close and forget every session.
    pub fn close_all(&self) {
        let drained: Vec<(String, Entry)> = self.inner.entries.lock().drain().collect();
        for (name, entry) in drained {
            debug!("Closing session {}", name);
            entry.session.close();
        }
    }
}

/// Forwards notifications only while its generation is the current one for its name.
struct GenerationGuard {
    name: String,
    generation: u64,
    registry: Weak<RegistryInner>,
}

impl GenerationGuard {
    /// Run `update` on the entry if it is still ours, and report whether it was.
    fn with_current(&self, registry: &RegistryInner, update: impl FnOnce(&mut Entry)) -> bool {
        let mut entries = registry.entries.lock();
        match entries.get_mut(&self.name) {
            Some(entry) if entry.generation == self.generation => {
                update(entry);
                true
            }
            _ => false,
        }
    }
}

impl SessionHandler for GenerationGuard {
    fn on_connection_change(&self, identity: &str, connected: bool) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if self.with_current(&registry, |entry| entry.connected = connected) {
            registry.handler.on_connection_change(identity, connected);
        } else {
            trace!(
                "Suppressed connection change from stale session {} (generation {})",
                identity, self.generation
            );
        }
    }

    fn on_message(&self, envelope: &Envelope) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if self.with_current(&registry, |_| {}) {
            registry.handler.on_message(envelope);
        } else {
            trace!(
                "Suppressed message from stale session {} (generation {})",
                self.name, self.generation
            );
        }
    }
}
