//! # turborpc
//!
//! Correlated request/response over a message transport. Callers send a named request
//! and get back its response, or a deterministic failure, without managing connection
//! state, retries or keepalive.
//!
//! ## Features
//!
//! - **Correlation**: many in-flight requests over one connection, matched by id
//! - **Heartbeat**: application-level `PING`/`PONG` detects half-open connections
//! - **Request expiry**: a background sweep fails requests that never get a response
//! - **Reconnection**: exponential backoff with jitter and a retry budget; policy
//!   rejections from the peer stop it for good
//! - **Registry**: named sessions that silence replaced instances
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use turborpc::{Envelope, SessionConfig, TracingHandler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! turborpc::LoggingConfig::default().init()?;
//!
//! let session = turborpc::connect_websocket(
//!     "backend",
//!     "ws://localhost:9000",
//!     Arc::new(TracingHandler),
//!     SessionConfig::default().with_global_header("auth", "token"),
//! )?;
//! session.wait_until_open().await?;
//!
//! let reply = session
//!     .request(Envelope::new("sayHello", json!({"name": "X"})))
//!     .await?;
//! println!("{:?}", reply.envelope);
//!
//! session.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! ```text
//! turborpc                    # this facade
//! ├── turborpc-types          # Envelope, CorrelationId
//! ├── turborpc-transport-traits  # Connector, Frame, TransportError
//! ├── turborpc-session        # Session, ConnectionRegistry, config
//! ├── turborpc-websocket      # WebSocketConnector (feature "websocket")
//! └── turborpc-memory         # MemoryConnector (feature "memory")
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod logging;

pub use logging::LoggingConfig;

pub use turborpc_session::{
    ConfigError, ConnectionRegistry, NoopHandler, ReconnectConfig, Reply, Session,
    SessionConfig, SessionError, SessionHandler, SessionOptions, SessionResult, SessionState,
    SessionStats, TerminalReason, TracingHandler,
};
pub use turborpc_transport_traits::{
    CloseReason, Connection, Connector, Frame, LimitsConfig, TransportError, TransportResult,
    TransportType, close_code,
};
pub use turborpc_types::{CorrelationId, Envelope, EnvelopeError, Headers, STATUS_OK, routes};

#[cfg(feature = "memory")]
pub use turborpc_memory::{ConnectMode, MemoryConnector, MemoryListener, MemoryPeer};
#[cfg(feature = "websocket")]
pub use turborpc_websocket::WebSocketConnector;

/// Open a session to a `ws://` or `wss://` URL.
///
/// # Errors
///
/// Returns [`TransportError::ConfigurationError`] if `url` is not a WebSocket URL. All
/// connection failures after that are handled by the session's reconnect policy.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[cfg(feature = "websocket")]
pub fn connect_websocket(
    identity: impl Into<String>,
    url: &str,
    handler: std::sync::Arc<dyn SessionHandler>,
    config: SessionConfig,
) -> TransportResult<Session> {
    let url = turborpc_websocket::validate_address(url)?;
    tracing::debug!("Opening WebSocket session to {}", url);
    Ok(Session::connect(
        identity,
        url.as_str(),
        std::sync::Arc::new(WebSocketConnector::new()),
        handler,
        config,
    ))
}

/// A registry whose sessions connect over WebSocket.
#[cfg(feature = "websocket")]
pub fn websocket_registry(handler: std::sync::Arc<dyn SessionHandler>) -> ConnectionRegistry {
    ConnectionRegistry::new(std::sync::Arc::new(WebSocketConnector::new()), handler)
}
