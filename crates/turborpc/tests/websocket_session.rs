//! Sessions over a real WebSocket on a loopback socket.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use turborpc::{
    Envelope, NoopHandler, ReconnectConfig, SessionConfig, SessionError, SessionState,
    TerminalReason, TransportError,
};

/// Answer every request with its payload and every `PING` with a `PONG`.
async fn spawn_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else {
                        continue;
                    };
                    let request = Envelope::from_json(text.as_str()).unwrap();
                    let response = if request.is_ping() {
                        Envelope::pong().with_correlation_id(request.uuid.clone())
                    } else {
                        Envelope::reply_to(&request, request.payload.clone())
                    };
                    let text = response.to_json().unwrap();
                    if ws.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    format!("ws://{addr}")
}

fn config() -> SessionConfig {
    SessionConfig::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_reconnect_config(
            ReconnectConfig::new()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(20))
                .with_jitter(Duration::ZERO),
        )
}

#[tokio::test]
async fn test_request_over_websocket() {
    let url = spawn_echo_server().await;
    let session =
        turborpc::connect_websocket("echo", &url, Arc::new(NoopHandler), config()).unwrap();
    session.wait_until_open().await.unwrap();

    let reply = session
        .request(Envelope::new("sayHello", json!({"name": "X"})))
        .await
        .unwrap();

    assert!(reply.is_success());
    let envelope = reply.into_envelope().unwrap();
    assert_eq!(envelope.route, "sayHello");
    assert_eq!(envelope.payload, json!({"name": "X"}));

    session.close();
    session.closed().await;
    assert_eq!(
        session.state(),
        SessionState::Terminated(TerminalReason::ManualClose)
    );
}

#[tokio::test]
async fn test_concurrent_requests_are_correlated() {
    let url = spawn_echo_server().await;
    let session =
        turborpc::connect_websocket("echo", &url, Arc::new(NoopHandler), config()).unwrap();
    session.wait_until_open().await.unwrap();

    let requests = (0..16).map(|i| {
        let session = session.clone();
        async move {
            let reply = session
                .request(Envelope::new("echo", json!({ "n": i })))
                .await
                .unwrap();
            (i, reply.into_envelope().unwrap().payload)
        }
    });

    for (i, payload) in futures::future::join_all(requests).await {
        assert_eq!(payload, json!({ "n": i }));
    }
    assert_eq!(session.stats().requests_resolved, 16);
    session.close();
}

#[tokio::test]
async fn test_policy_close_terminates() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "unauthorized".into(),
        })))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    });

    let session =
        turborpc::connect_websocket("rejected", &url, Arc::new(NoopHandler), config()).unwrap();

    // The handshake succeeds, so the session is briefly open before the close arrives.
    let mut states = session.state_changes();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(SessionState::is_terminated),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(
        state,
        SessionState::Terminated(TerminalReason::PeerRejected { code: 1008 })
    );
    assert_eq!(session.stats().reconnection_attempts, 0);

    // Still addressable, but never reconnects.
    assert!(matches!(
        session.request(Envelope::new("x", json!(null))).await,
        Err(SessionError::NotConnected)
    ));
    session.close();
    session.closed().await;
}

#[tokio::test]
async fn test_unreachable_server_exhausts_retries() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let session =
        turborpc::connect_websocket("nowhere", &url, Arc::new(NoopHandler), config()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), session.wait_until_open()).await;
    assert!(matches!(
        result,
        Ok(Err(SessionError::Terminated(
            TerminalReason::RetriesExhausted { attempts: 2 }
        )))
    ));
    assert_eq!(session.stats().connection_errors, 3);
}

#[tokio::test]
async fn test_rejects_non_websocket_url() {
    let result = turborpc::connect_websocket(
        "bad",
        "http://localhost:9000",
        Arc::new(NoopHandler),
        SessionConfig::default(),
    );
    assert!(matches!(
        result,
        Err(TransportError::ConfigurationError(_))
    ));
}
