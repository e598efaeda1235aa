//! # turborpc Session
//!
//! Request/response sessions over a message transport. A [`Session`] owns one logical
//! connection to an address and hides its lifecycle from callers:
//!
//! - **Correlation**: concurrent requests share one connection and are matched to their
//!   responses by correlation id
//! - **Heartbeat**: `PING`/`PONG` envelopes detect half-open connections
//! - **Expiry sweep**: requests without a response fail after the request timeout
//! - **Reconnection**: exponential backoff with jitter, bounded by a retry budget, with
//!   policy close codes treated as terminal
//! - **Registry**: named sessions with stale-notification suppression
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turborpc_session::{Session, SessionConfig, TracingHandler};
//! use turborpc_types::Envelope;
//! use serde_json::json;
//!
//! let session = Session::connect(
//!     "backend",
//!     "ws://localhost:9000",
//!     Arc::new(connector),
//!     Arc::new(TracingHandler),
//!     SessionConfig::default(),
//! );
//! session.wait_until_open().await?;
//!
//! let reply = session.request(Envelope::new("sayHello", json!({"name": "X"}))).await?;
//! assert!(reply.success);
//! session.close();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! turborpc-session/
//! ├── config.rs    # SessionConfig, ReconnectConfig, SessionOptions (file/env loading)
//! ├── session.rs   # Session handle
//! ├── actor.rs     # Per-session task: state machine, timers, connection tasks
//! ├── pending.rs   # Correlation id -> waiter table
//! ├── backoff.rs   # Reconnect delays
//! ├── registry.rs  # Named sessions
//! ├── handler.rs   # SessionHandler trait
//! ├── state.rs     # SessionState, TerminalReason
//! ├── reply.rs     # Reply
//! ├── stats.rs     # SessionStats
//! └── error.rs     # SessionError
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

mod actor;
mod backoff;
pub mod config;
pub mod error;
pub mod handler;
mod pending;
pub mod registry;
pub mod reply;
pub mod session;
pub mod state;
pub mod stats;

pub use config::{ConfigError, ReconnectConfig, SessionConfig, SessionOptions};
pub use error::{SessionError, SessionResult};
pub use handler::{NoopHandler, SessionHandler, TracingHandler};
pub use registry::ConnectionRegistry;
pub use reply::Reply;
pub use session::Session;
pub use state::{SessionState, TerminalReason};
pub use stats::SessionStats;
