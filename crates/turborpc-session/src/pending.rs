//! Table of requests waiting for a correlated response.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::oneshot;
use tokio::time::Instant;
use turborpc_types::CorrelationId;

use crate::error::{SessionError, SessionResult};
use crate::reply::Reply;

/// Callback form of a reply handler.
pub(crate) type ReplyCallback = Box<dyn FnOnce(Reply) + Send + 'static>;

/// Where the outcome of a request goes.
pub(crate) enum ReplyHandler {
    /// An awaiting caller.
    Channel(oneshot::Sender<SessionResult<Reply>>),
    /// A caller-supplied callback.
    Callback(ReplyCallback),
}

impl ReplyHandler {
    /// Deliver a reply.
    pub(crate) fn resolve(self, reply: Reply) {
        match self {
            // The caller may have dropped its future.
            Self::Channel(tx) => {
                let _ = tx.send(Ok(reply));
            }
            Self::Callback(callback) => callback(reply),
        }
    }

    /// Refuse the request before it was sent.
    ///
    /// Awaiting callers see `error`; callbacks see a failed [`Reply`].
    pub(crate) fn reject(self, error: SessionError) {
        match self {
            Self::Channel(tx) => {
                let _ = tx.send(Err(error));
            }
            Self::Callback(callback) => callback(Reply::failure()),
        }
    }
}

impl fmt::Debug for ReplyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(_) => f.write_str("ReplyHandler::Channel"),
            Self::Callback(_) => f.write_str("ReplyHandler::Callback"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Waiter {
    handler: ReplyHandler,
    expire_at: Instant,
}

impl Waiter {
    pub(crate) fn new(handler: ReplyHandler, expire_at: Instant) -> Self {
        Self { handler, expire_at }
    }

    pub(crate) fn resolve(self, reply: Reply) {
        self.handler.resolve(reply);
    }

    pub(crate) fn fail(self) {
        self.handler.resolve(Reply::failure());
    }
}

/// Waiters keyed by correlation id.
///
/// Every waiter leaves the table exactly once: through [`take`](Self::take) on a matching
/// response, [`expire`](Self::expire), or [`fail_all`](Self::fail_all).
#[derive(Debug, Default)]
pub(crate) struct PendingRequests {
    waiters: HashMap<CorrelationId, Waiter>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a waiter, returning the one it displaced, if any.
    pub(crate) fn insert(&mut self, id: CorrelationId, waiter: Waiter) -> Option<Waiter> {
        self.waiters.insert(id, waiter)
    }

    pub(crate) fn take(&mut self, id: &CorrelationId) -> Option<Waiter> {
        self.waiters.remove(id)
    }

    /// Fail every waiter whose deadline is at or before `now`. Returns how many expired.
    pub(crate) fn expire(&mut self, now: Instant) -> usize {
        let expired: Vec<CorrelationId> = self
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.expire_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(waiter) = self.waiters.remove(id) {
                waiter.fail();
            }
        }
        expired.len()
    }

    /// Fail and remove every waiter. Returns how many were pending.
    pub(crate) fn fail_all(&mut self) -> usize {
        let count = self.waiters.len();
        for (_, waiter) in self.waiters.drain() {
            waiter.fail();
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
