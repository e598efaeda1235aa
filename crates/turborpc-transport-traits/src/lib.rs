//! # turborpc Transport Traits
//!
//! Core transport traits and types for turborpc. This crate provides the foundational
//! abstractions that every transport implementation and the session layer depend on.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Traits**: [`Connector`], which opens a fresh [`Connection`] to an address
//! - **Types**: [`Frame`], [`CloseReason`], [`TransportType`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Config**: [`LimitsConfig`]
//!
//! A transport is message oriented: it moves whole text or binary frames, nothing else.
//! Correlation, keepalive and reconnection are layered on top by `turborpc-session`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use turborpc_transport_traits::{Connection, Connector, ConnectFuture, TransportType};
//!
//! #[derive(Debug)]
//! struct MyConnector;
//!
//! impl Connector for MyConnector {
//!     fn transport_type(&self) -> TransportType { /* ... */ }
//!     fn connect(&self, address: &str) -> ConnectFuture { /* ... */ }
//! }
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

mod config;
mod error;
mod frame;
mod traits;
mod types;

pub use config::LimitsConfig;
pub use error::{TransportError, TransportResult};
pub use frame::{CloseReason, Frame, close_code};
pub use traits::{ConnectFuture, Connection, Connector, FrameSink, FrameStream};
pub use types::TransportType;

pub use error::{validate_inbound_size, validate_outbound_size};
