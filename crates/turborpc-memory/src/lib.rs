//! # turborpc Memory Transport
//!
//! An in-process transport: every [`Connector::connect`] call creates a fresh channel
//! pair and hands the far end to the [`MemoryListener`] as a [`MemoryPeer`]. Tests play
//! the server by accepting peers and reading or writing frames directly.
//!
//! ```rust,ignore
//! let (connector, mut listener) = MemoryConnector::new();
//! // hand `connector` to a session...
//! let mut peer = listener.accept().await.unwrap();
//! let frame = peer.recv().await;
//! peer.send(Frame::text(r#"{"uuid":"1","route":"PONG"}"#))?;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

mod connector;
mod peer;

pub use connector::{ConnectMode, MemoryConnector, MemoryListener};
pub use peer::MemoryPeer;

pub use turborpc_transport_traits::Connector;
