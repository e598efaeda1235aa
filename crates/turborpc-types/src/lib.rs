//! # turborpc Types
//!
//! The wire-level value types exchanged by turborpc sessions.
//!
//! An [`Envelope`] is the single message unit on the wire. It serializes to a JSON object:
//!
//! ```text
//! { "uuid": "<correlation id>", "route": "<string>", "headers": {..}|null,
//!   "payload": <any>, "status": <integer> }
//! ```
//!
//! ```rust
//! use turborpc_types::Envelope;
//! use serde_json::json;
//!
//! let request = Envelope::new("sayHello", json!({ "name": "X" }));
//! let wire = request.to_json().unwrap();
//! assert_eq!(Envelope::from_json(&wire).unwrap(), request);
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

mod correlation;
mod envelope;
mod error;

pub use correlation::CorrelationId;
pub use envelope::{Envelope, Headers, STATUS_OK, routes};
pub use error::{EnvelopeError, EnvelopeResult};

/// Structured payload and header values.
pub use serde_json::Value;
