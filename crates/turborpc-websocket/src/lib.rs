//! # turborpc WebSocket Transport
//!
//! WebSocket client transport for turborpc sessions, built on `tokio-tungstenite`.
//!
//! The connector only opens sockets and translates frames. Protocol-level ping/pong
//! control frames are answered by tungstenite itself and never surface; the session's
//! own `PING`/`PONG` envelopes travel as ordinary text frames.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turborpc_websocket::WebSocketConnector;
//! use turborpc_transport_traits::Connector;
//!
//! let connector = WebSocketConnector::new();
//! let connection = connector.connect("ws://localhost:8080/rpc").await?;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod codec;
mod connector;

pub use connector::{WebSocketConnector, validate_address};

pub use turborpc_transport_traits::{Connector, Frame, TransportError, TransportResult};
