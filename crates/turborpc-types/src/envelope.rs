//! The envelope message type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Header map carried by an envelope.
pub type Headers = HashMap<String, Value>;

/// Status code of a successful envelope.
pub const STATUS_OK: i32 = 200;

/// Routes reserved by the heartbeat sub-protocol.
pub mod routes {
    /// Client to peer keepalive probe.
    pub const PING: &str = "PING";
    /// Peer to client keepalive answer. Never forwarded to callers.
    pub const PONG: &str = "PONG";
}

const fn default_status() -> i32 {
    STATUS_OK
}

/// The structured message unit exchanged over a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation identifier; the only key used to match a response to its request.
    pub uuid: CorrelationId,

    /// Logical endpoint, or one of the reserved [`routes`].
    pub route: String,

    /// Request or response headers.
    #[serde(default)]
    pub headers: Option<Headers>,

    /// Arbitrary structured payload.
    #[serde(default)]
    pub payload: Value,

    /// Status code, [`STATUS_OK`] unless set.
    #[serde(default = "default_status")]
    pub status: i32,
}

impl Envelope {
    /// Create an envelope with a freshly generated correlation id.
    pub fn new(route: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            uuid: CorrelationId::generate(),
            route: route.into(),
            headers: None,
            payload: payload.into(),
            status: STATUS_OK,
        }
    }

    /// A heartbeat probe.
    pub fn ping() -> Self {
        Self::new(routes::PING, Value::Null)
    }

    /// A heartbeat answer.
    pub fn pong() -> Self {
        Self::new(routes::PONG, Value::Null)
    }

    /// Build a response to `request`, reusing its correlation id and route.
    pub fn reply_to(request: &Self, payload: impl Into<Value>) -> Self {
        Self {
            uuid: request.uuid.clone(),
            route: request.route.clone(),
            headers: None,
            payload: payload.into(),
            status: STATUS_OK,
        }
    }

    /// Replace the correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<CorrelationId>) -> Self {
        self.uuid = id.into();
        self
    }

    /// Replace all headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set a single header, keeping the others.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the status code.
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    /// Correlation identifier of this envelope.
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.uuid
    }

    /// Look up a header value.
    pub fn header(&self, key: &str) -> Option<&Value> {
        self.headers.as_ref().and_then(|headers| headers.get(key))
    }

    /// Returns `true` for `PING` envelopes.
    pub fn is_ping(&self) -> bool {
        self.route == routes::PING
    }

    /// Returns `true` for `PONG` envelopes.
    pub fn is_pong(&self) -> bool {
        self.route == routes::PONG
    }

    /// Returns `true` if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Overlay this envelope's headers on top of `global`.
    ///
    /// Keys present in both keep this envelope's value. An empty `global` leaves the
    /// envelope untouched, so a header-less envelope still serializes `"headers": null`.
    pub fn merged_with(mut self, global: &Headers) -> Self {
        if global.is_empty() {
            return self;
        }
        let mut merged = global.clone();
        if let Some(own) = self.headers.take() {
            merged.extend(own);
        }
        self.headers = Some(merged);
        self
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> EnvelopeResult<String> {
        serde_json::to_string(self).map_err(EnvelopeError::Encode)
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> EnvelopeResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(EnvelopeError::Encode)
    }

    /// Parse the JSON wire form.
    pub fn from_json(text: &str) -> EnvelopeResult<Self> {
        serde_json::from_str(text).map_err(EnvelopeError::Decode)
    }

    /// Parse JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> EnvelopeResult<Self> {
        serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)
    }
}
