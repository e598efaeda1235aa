//! Session counters.

use std::time::{Duration, SystemTime};

/// Counters and timestamps describing a session's traffic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Envelopes written to the transport, heartbeat probes included
    pub messages_sent: u64,
    /// Envelopes read from the transport, heartbeat answers included
    pub messages_received: u64,
    /// Heartbeat probes sent
    pub pings_sent: u64,
    /// Heartbeat answers received
    pub pongs_received: u64,
    /// Inbound frames dropped because they were oversize or not an envelope
    pub malformed_frames: u64,
    /// Requests resolved with a response
    pub requests_resolved: u64,
    /// Requests failed by the expiry sweep
    pub requests_expired: u64,
    /// Requests failed because the transport closed while they were pending
    pub requests_failed_on_close: u64,
    /// Successful opens, including reconnects
    pub connections_opened: u64,
    /// Connect attempts that failed or timed out
    pub connection_errors: u64,
    /// Reconnects scheduled
    pub reconnection_attempts: u64,
    /// Requests currently waiting for a response
    pub pending_requests: usize,
    /// Whether the heartbeat loop is running
    pub heartbeat_running: bool,
    /// Whether the expiry sweep is running
    pub sweep_running: bool,
    /// Time the current transport opened
    pub connected_at: Option<SystemTime>,
    /// Time of the last frame in either direction
    pub last_activity: Option<SystemTime>,
}

impl SessionStats {
    /// Create new session statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_message_sent(&mut self) {
        self.messages_sent += 1;
        self.last_activity = Some(SystemTime::now());
    }

    pub(crate) fn record_message_received(&mut self) {
        self.messages_received += 1;
        self.last_activity = Some(SystemTime::now());
    }

    pub(crate) fn record_ping_sent(&mut self) {
        self.pings_sent += 1;
    }

    pub(crate) fn record_pong_received(&mut self) {
        self.pongs_received += 1;
    }

    pub(crate) fn record_malformed_frame(&mut self) {
        self.malformed_frames += 1;
    }

    pub(crate) fn record_opened(&mut self) {
        self.connections_opened += 1;
        self.connected_at = Some(SystemTime::now());
    }

    pub(crate) fn record_closed(&mut self) {
        self.connected_at = None;
    }

    pub(crate) fn record_connection_error(&mut self) {
        self.connection_errors += 1;
    }

    pub(crate) fn record_reconnection_attempt(&mut self) {
        self.reconnection_attempts += 1;
    }

    /// Time since the current transport opened
    pub fn uptime(&self) -> Option<Duration> {
        self.connected_at
            .and_then(|connected_at| SystemTime::now().duration_since(connected_at).ok())
    }

    /// Time since the last frame in either direction
    pub fn idle_time(&self) -> Option<Duration> {
        self.last_activity
            .and_then(|last_activity| SystemTime::now().duration_since(last_activity).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = SessionStats::new();
        assert!(stats.uptime().is_none());
        assert!(stats.idle_time().is_none());

        stats.record_opened();
        stats.record_message_sent();
        stats.record_message_received();
        stats.record_ping_sent();
        stats.record_pong_received();

        assert_eq!(stats.connections_opened, 1);
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.messages_received, 1);
        assert_eq!(stats.pings_sent, 1);
        assert_eq!(stats.pongs_received, 1);
        assert!(stats.uptime().is_some());
        assert!(stats.idle_time().is_some());

        stats.record_closed();
        assert!(stats.uptime().is_none());
    }
}
