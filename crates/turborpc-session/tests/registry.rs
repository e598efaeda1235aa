use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use turborpc_memory::{MemoryConnector, MemoryListener, MemoryPeer};
use turborpc_session::{
    ConnectionRegistry, SessionConfig, SessionHandler, SessionState, TerminalReason,
};
use turborpc_types::Envelope;

#[derive(Default)]
struct Downstream {
    changes: Mutex<Vec<(String, bool)>>,
    messages: Mutex<Vec<String>>,
}

impl SessionHandler for Downstream {
    fn on_connection_change(&self, identity: &str, connected: bool) {
        self.changes.lock().push((identity.to_string(), connected));
    }

    fn on_message(&self, envelope: &Envelope) {
        self.messages.lock().push(envelope.route.clone());
    }
}

fn config() -> SessionConfig {
    SessionConfig::new().with_heartbeat_rate(Duration::from_secs(3600))
}

fn registry() -> (ConnectionRegistry, MemoryListener, Arc<Downstream>) {
    let (connector, listener) = MemoryConnector::new();
    let downstream = Arc::new(Downstream::default());
    let registry = ConnectionRegistry::new(Arc::new(connector), downstream.clone());
    (registry, listener, downstream)
}

async fn add_open(
    registry: &ConnectionRegistry,
    listener: &mut MemoryListener,
    name: &str,
) -> MemoryPeer {
    let session = registry.add(name, format!("memory://{name}"), config());
    let peer = listener.accept().await.unwrap();
    session.wait_until_open().await.unwrap();
    peer
}

#[tokio::test(start_paused = true)]
async fn tracks_sessions_by_name() {
    let (registry, mut listener, downstream) = registry();
    let _b = add_open(&registry, &mut listener, "b").await;
    let _a = add_open(&registry, &mut listener, "a").await;

    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.is_connected("a"), Some(true));
    assert_eq!(registry.is_connected("missing"), None);
    assert_eq!(registry.get("a").unwrap().address(), "memory://a");
    assert_eq!(
        *downstream.changes.lock(),
        vec![("b".to_string(), true), ("a".to_string(), true)]
    );
}

#[tokio::test(start_paused = true)]
async fn replaced_session_is_silenced() {
    let (registry, mut listener, downstream) = registry();
    let old_peer = add_open(&registry, &mut listener, "api").await;
    let old = registry.get("api").unwrap();

    let _new_peer = add_open(&registry, &mut listener, "api").await;
    old.closed().await;
    assert_eq!(
        old.state(),
        SessionState::Terminated(TerminalReason::ManualClose)
    );

    // The old peer can still talk, but nobody downstream hears it.
    let _ = old_peer.send_text(Envelope::new("stale", serde_json::Value::Null).to_json().unwrap());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        *downstream.changes.lock(),
        vec![("api".to_string(), true), ("api".to_string(), true)]
    );
    assert!(downstream.messages.lock().is_empty());
    assert_eq!(registry.is_connected("api"), Some(true));
    assert_eq!(registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn current_session_notifications_pass_through() {
    let (registry, mut listener, downstream) = registry();
    let peer = add_open(&registry, &mut listener, "api").await;

    peer.send_text(Envelope::new("event", serde_json::Value::Null).to_json().unwrap())
        .unwrap();
    while downstream.messages.lock().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*downstream.messages.lock(), vec!["event".to_string()]);

    drop(peer);
    while registry.is_connected("api") == Some(true) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        downstream.changes.lock().last(),
        Some(&("api".to_string(), false))
    );
}

#[tokio::test(start_paused = true)]
async fn remove_closes_quietly() {
    let (registry, mut listener, downstream) = registry();
    let _peer = add_open(&registry, &mut listener, "api").await;
    let session = registry.get("api").unwrap();

    assert!(registry.remove("api"));
    assert!(!registry.remove("api"));
    session.closed().await;

    assert!(registry.is_empty());
    assert_eq!(registry.is_connected("api"), None);
    assert_eq!(*downstream.changes.lock(), vec![("api".to_string(), true)]);
}

#[tokio::test(start_paused = true)]
async fn close_all_stops_every_session() {
    let (registry, mut listener, _downstream) = registry();
    let _a = add_open(&registry, &mut listener, "a").await;
    let _b = add_open(&registry, &mut listener, "b").await;
    let sessions = [registry.get("a").unwrap(), registry.get("b").unwrap()];

    registry.close_all();
    for session in &sessions {
        session.closed().await;
        assert!(session.state().is_terminated());
    }
    assert!(registry.names().is_empty());
}
