//! The per-session actor task.
//!
//! All session state lives here and is touched from one task only. Handles talk to the
//! actor over a command channel; every physical connection gets a reader and a writer
//! task that forward into the actor's event channel, tagged with the epoch of the
//! connection so that events from a replaced connection are ignored.

use std::fmt;
use std::future::pending;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt as _, StreamExt as _};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, trace, warn};
use turborpc_transport_traits::{
    CloseReason, Connection, Connector, Frame, FrameSink, FrameStream, TransportError,
    TransportResult, validate_inbound_size, validate_outbound_size,
};
use turborpc_types::Envelope;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::handler::SessionHandler;
use crate::pending::{PendingRequests, ReplyHandler, Waiter};
use crate::reply::Reply;
use crate::state::{SessionState, TerminalReason};
use crate::stats::SessionStats;

/// How long a writer may spend finishing the close handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Requests sent by [`Session`](crate::Session) handles.
#[derive(Debug)]
pub(crate) enum Command {
    Send(Envelope),
    Request {
        envelope: Envelope,
        reply: ReplyHandler,
    },
    Close,
}

/// Everything the actor shares with its handles.
pub(crate) struct ActorSetup {
    pub(crate) identity: Arc<str>,
    pub(crate) address: Arc<str>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) handler: Arc<dyn SessionHandler>,
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) stats: Arc<RwLock<SessionStats>>,
}

/// Start the actor for one session.
pub(crate) fn spawn(
    setup: ActorSetup,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<SessionState>,
) -> JoinHandle<()> {
    let (events_tx, events) = mpsc::unbounded_channel();
    let actor = SessionActor {
        identity: setup.identity,
        address: setup.address,
        connector: setup.connector,
        handler: setup.handler,
        config: setup.config,
        stats: setup.stats,
        commands,
        events,
        events_tx,
        state,
        phase: Phase::Idle,
        epoch: 0,
        pending: PendingRequests::new(),
        timers: Timers::default(),
        reconnect_attempts: 0,
        manually_closed: false,
        finished: false,
    };
    tokio::spawn(actor.run())
}

enum LinkEvent {
    Connected {
        epoch: u64,
        result: TransportResult<Connection>,
    },
    Inbound {
        epoch: u64,
        frame: Frame,
    },
    Closed {
        epoch: u64,
        cause: CloseCause,
    },
}

impl LinkEvent {
    fn epoch(&self) -> u64 {
        match self {
            Self::Connected { epoch, .. }
            | Self::Inbound { epoch, .. }
            | Self::Closed { epoch, .. } => *epoch,
        }
    }
}

#[derive(Debug)]
enum CloseCause {
    ConnectFailed(TransportError),
    Peer(Option<CloseReason>),
    StreamEnded,
    Transport(TransportError),
    HeartbeatTimeout,
    Manual,
}

impl CloseCause {
    fn close_code(&self) -> Option<u16> {
        match self {
            Self::Peer(Some(reason)) => Some(reason.code),
            _ => None,
        }
    }
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            Self::Peer(Some(reason)) => write!(f, "closed by peer with {reason}"),
            Self::Peer(None) => write!(f, "closed by peer"),
            Self::StreamEnded => write!(f, "connection dropped"),
            Self::Transport(e) => write!(f, "{e}"),
            Self::HeartbeatTimeout => write!(f, "heartbeat timed out"),
            Self::Manual => write!(f, "closed by caller"),
        }
    }
}

/// One open connection: its writer queue and the two tasks driving it.
struct Link {
    outbound: mpsc::UnboundedSender<Frame>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Link {
    fn spawn(epoch: u64, connection: Connection, events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        let Connection { sink, stream, .. } = connection;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_frames(epoch, sink, outbound_rx, events.clone()));
        let reader = tokio::spawn(read_frames(epoch, stream, events));
        Self {
            outbound,
            reader,
            writer,
        }
    }

    fn send(&self, frame: Frame) -> TransportResult<()> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::ConnectionLost("writer task stopped".to_string()))
    }

    /// Queue a close frame; the writer flushes it and closes the sink.
    fn close_gracefully(self, reason: CloseReason) {
        let _ = self.outbound.send(Frame::Close(Some(reason)));
    }

    /// Drop the connection without a close handshake.
    fn abort(self) {
        self.writer.abort();
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn write_frames(
    epoch: u64,
    mut sink: FrameSink,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(frame) = outbound.recv().await {
        let closing = frame.is_close();
        if let Err(e) = sink.send(frame).await {
            let _ = events.send(LinkEvent::Closed {
                epoch,
                cause: CloseCause::Transport(e),
            });
            return;
        }
        if closing {
            break;
        }
    }
    let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
}

async fn read_frames(epoch: u64, mut stream: FrameStream, events: mpsc::UnboundedSender<LinkEvent>) {
    let cause = loop {
        match stream.next().await {
            Some(Ok(Frame::Close(reason))) => break CloseCause::Peer(reason),
            Some(Ok(frame)) => {
                if events.send(LinkEvent::Inbound { epoch, frame }).is_err() {
                    return;
                }
            }
            Some(Err(e)) => break CloseCause::Transport(e),
            None => break CloseCause::StreamEnded,
        }
    };
    let _ = events.send(LinkEvent::Closed { epoch, cause });
}

enum Phase {
    /// No transport and no connect attempt.
    Idle,
    Connecting(JoinHandle<()>),
    Open(Link),
}

impl Phase {
    fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Timer handles. `None` means stopped.
#[derive(Default)]
struct Timers {
    heartbeat: Option<Interval>,
    heartbeat_deadline: Option<Pin<Box<Sleep>>>,
    sweep: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl Timers {
    fn stop_open_loops(&mut self) {
        self.heartbeat = None;
        self.heartbeat_deadline = None;
        self.sweep = None;
    }
}

fn periodic(period: Duration) -> Interval {
    // First tick one full period from now, not immediately.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => {
            sleep.as_mut().await;
            *timer = None;
        }
        None => pending().await,
    }
}

enum Step {
    Command(Command),
    Orphaned,
    Link(LinkEvent),
    HeartbeatTick,
    HeartbeatTimeout,
    Sweep,
    Reconnect,
}

struct SessionActor {
    identity: Arc<str>,
    address: Arc<str>,
    connector: Arc<dyn Connector>,
    handler: Arc<dyn SessionHandler>,
    config: Arc<SessionConfig>,
    stats: Arc<RwLock<SessionStats>>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    state: watch::Sender<SessionState>,
    phase: Phase,
    epoch: u64,
    pending: PendingRequests,
    timers: Timers,
    reconnect_attempts: u32,
    manually_closed: bool,
    finished: bool,
}

impl SessionActor {
    async fn run(mut self) {
        debug!("Session {} started for {}", self.identity, self.address);
        self.begin_connect();

        while !self.finished {
            let step = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Orphaned,
                },
                Some(event) = self.events.recv() => Step::Link(event),
                () = tick(&mut self.timers.heartbeat) => Step::HeartbeatTick,
                () = fire(&mut self.timers.heartbeat_deadline) => Step::HeartbeatTimeout,
                () = tick(&mut self.timers.sweep) => Step::Sweep,
                () = fire(&mut self.timers.reconnect) => Step::Reconnect,
            };

            match step {
                Step::Command(Command::Send(envelope)) => self.on_send(envelope),
                Step::Command(Command::Request { envelope, reply }) => {
                    self.on_request(envelope, reply);
                }
                Step::Command(Command::Close) => self.close(),
                Step::Orphaned => {
                    debug!("Session {} has no handles left", self.identity);
                    self.close();
                }
                Step::Link(event) => self.on_link_event(event),
                Step::HeartbeatTick => self.on_heartbeat_tick(),
                Step::HeartbeatTimeout => self.on_heartbeat_timeout(),
                Step::Sweep => self.on_sweep(),
                Step::Reconnect => self.on_reconnect_due(),
            }
            self.sync_stats();
        }

        debug!("Session {} stopped", self.identity);
    }

    /// Open a new transport. Used at construction and for every reconnect.
    fn begin_connect(&mut self) {
        self.epoch += 1;
        let epoch = self.epoch;
        let timeout = self.config.connect_timeout;
        let address = self.address.to_string();
        let attempt = self.connector.connect(&address);
        let events = self.events_tx.clone();

        debug!(
            "Session {} connecting to {} over {} (epoch {})",
            self.identity,
            self.address,
            self.connector.transport_type(),
            epoch
        );

        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::ConnectionTimeout { address, timeout }),
            };
            let _ = events.send(LinkEvent::Connected { epoch, result });
        });

        self.phase = Phase::Connecting(task);
        self.publish(SessionState::Connecting);
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        if event.epoch() != self.epoch {
            trace!(
                "Session {} ignoring event from connection epoch {}",
                self.identity,
                event.epoch()
            );
            return;
        }

        match event {
            LinkEvent::Connected { result, .. } => self.on_connected(result),
            LinkEvent::Inbound { frame, .. } => {
                if self.phase.is_open() {
                    self.on_frame(&frame);
                }
            }
            LinkEvent::Closed { cause, .. } => {
                if self.take_link().is_some() {
                    self.on_closed(cause);
                }
            }
        }
    }

    fn on_connected(&mut self, result: TransportResult<Connection>) {
        if !matches!(self.phase, Phase::Connecting(_)) {
            return;
        }

        match result {
            Ok(connection) => {
                info!(
                    "Session {} connected to {}",
                    self.identity, connection.endpoint
                );
                self.phase = Phase::Open(Link::spawn(
                    self.epoch,
                    connection,
                    self.events_tx.clone(),
                ));
                self.reconnect_attempts = 0;
                self.stats.write().record_opened();
                self.handler.on_connection_change(&self.identity, true);

                self.timers.heartbeat = Some(periodic(self.config.heartbeat_rate));
                self.timers.heartbeat_deadline = None;
                self.timers.sweep = self
                    .config
                    .sweep_enabled
                    .then(|| periodic(self.config.sweep_interval));

                self.publish(SessionState::Open);
            }
            Err(e) => {
                warn!(
                    "Session {} failed to connect to {}: {}",
                    self.identity, self.address, e
                );
                self.stats.write().record_connection_error();
                self.phase = Phase::Idle;
                self.on_closed(CloseCause::ConnectFailed(e));
            }
        }
    }

    fn on_frame(&mut self, frame: &Frame) {
        let Some(bytes) = frame.as_bytes() else {
            return;
        };

        if let Err(e) = validate_inbound_size(bytes.len(), &self.config.limits) {
            warn!("Session {} dropping inbound frame: {}", self.identity, e);
            self.stats.write().record_malformed_frame();
            return;
        }

        let envelope = match Envelope::from_slice(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Session {} dropping malformed frame: {}", self.identity, e);
                self.stats.write().record_malformed_frame();
                return;
            }
        };
        self.stats.write().record_message_received();

        if envelope.is_pong() {
            trace!("Session {} heartbeat answered", self.identity);
            self.timers.heartbeat_deadline = None;
            self.stats.write().record_pong_received();
            return;
        }

        trace!(
            "Session {} received {} (uuid {})",
            self.identity, envelope.route, envelope.uuid
        );
        self.handler.on_message(&envelope);

        if let Some(waiter) = self.pending.take(&envelope.uuid) {
            self.stats.write().requests_resolved += 1;
            waiter.resolve(Reply::success(envelope));
        }
    }

    /// Stamp global headers, encode and queue one envelope on the open transport.
    fn transmit(&self, envelope: Envelope) -> SessionResult<()> {
        let Phase::Open(link) = &self.phase else {
            return Err(SessionError::NotConnected);
        };

        let envelope = envelope.merged_with(&self.config.global_headers);
        let text = envelope.to_json()?;
        validate_outbound_size(text.len(), &self.config.limits)?;
        link.send(Frame::Text(text))?;

        self.stats.write().record_message_sent();
        trace!(
            "Session {} sent {} (uuid {})",
            self.identity, envelope.route, envelope.uuid
        );
        Ok(())
    }

    fn on_send(&mut self, envelope: Envelope) {
        let route = envelope.route.clone();
        if let Err(e) = self.transmit(envelope) {
            warn!("Session {} failed to send {}: {}", self.identity, route, e);
        }
    }

    fn on_request(&mut self, envelope: Envelope, reply: ReplyHandler) {
        if !self.phase.is_open() {
            debug!(
                "Session {} not connected; rejecting request {}",
                self.identity, envelope.route
            );
            reply.reject(SessionError::NotConnected);
            return;
        }

        let id = envelope.uuid.clone();
        let route = envelope.route.clone();
        let waiter = Waiter::new(reply, Instant::now() + self.config.request_timeout);
        if let Some(displaced) = self.pending.insert(id.clone(), waiter) {
            warn!(
                "Session {} reused correlation id {}; failing the earlier request",
                self.identity, id
            );
            displaced.fail();
        }

        if let Err(e) = self.transmit(envelope) {
            warn!(
                "Session {} failed to send request {}: {}",
                self.identity, route, e
            );
            if let Some(waiter) = self.pending.take(&id) {
                waiter.fail();
            }
        }
    }

    fn on_heartbeat_tick(&mut self) {
        if !self.phase.is_open() {
            self.timers.heartbeat = None;
            return;
        }

        match self.transmit(Envelope::ping()) {
            Ok(()) => {
                self.stats.write().record_ping_sent();
                trace!("Session {} sent heartbeat", self.identity);
                // The oldest unanswered ping sets the deadline.
                if self.timers.heartbeat_deadline.is_none() {
                    self.timers.heartbeat_deadline =
                        Some(Box::pin(tokio::time::sleep(self.config.heartbeat_timeout)));
                }
            }
            Err(e) => warn!("Session {} failed to send heartbeat: {}", self.identity, e),
        }
    }

    fn on_heartbeat_timeout(&mut self) {
        if let Some(link) = self.take_link() {
            warn!(
                "Session {} got no heartbeat answer within {:?}; dropping connection",
                self.identity, self.config.heartbeat_timeout
            );
            link.abort();
            self.on_closed(CloseCause::HeartbeatTimeout);
        }
    }

    fn on_sweep(&mut self) {
        let expired = self.pending.expire(Instant::now());
        if expired > 0 {
            debug!(
                "Session {} expired {} pending requests",
                self.identity, expired
            );
            self.stats.write().requests_expired += expired as u64;
        }
    }

    fn on_reconnect_due(&mut self) {
        if self.manually_closed || !matches!(self.phase, Phase::Idle) {
            return;
        }
        self.begin_connect();
    }

    /// The close transition, run once per transport whatever the cause.
    fn on_closed(&mut self, cause: CloseCause) {
        self.timers.stop_open_loops();

        let failed = self.pending.fail_all();
        {
            let mut stats = self.stats.write();
            stats.requests_failed_on_close += failed as u64;
            stats.record_closed();
        }
        if failed > 0 {
            debug!(
                "Session {} failed {} pending requests on close",
                self.identity, failed
            );
        }

        info!("Session {} disconnected: {}", self.identity, cause);
        self.handler.on_connection_change(&self.identity, false);

        let rejected = cause
            .close_code()
            .filter(|code| self.config.is_terminal_close(*code));

        if let Some(code) = rejected {
            warn!(
                "Session {} rejected by peer with close code {}; not reconnecting",
                self.identity, code
            );
            self.terminate(TerminalReason::PeerRejected { code });
        } else if self.manually_closed {
            self.terminate(TerminalReason::ManualClose);
        } else if self.reconnect_attempts < self.config.reconnect.max_retries {
            self.schedule_reconnect();
        } else {
            error!(
                "Maximum reconnection attempts ({}) reached for session {}",
                self.config.reconnect.max_retries, self.identity
            );
            self.terminate(TerminalReason::RetriesExhausted {
                attempts: self.reconnect_attempts,
            });
        }
    }

    fn schedule_reconnect(&mut self) {
        let delay = self.config.reconnect.delay_for(self.reconnect_attempts);
        self.reconnect_attempts += 1;
        self.stats.write().record_reconnection_attempt();

        info!(
            "Attempting reconnection {} of {} for session {} (delay: {:?})",
            self.reconnect_attempts, self.config.reconnect.max_retries, self.identity, delay
        );
        self.timers.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
        self.publish(SessionState::Backoff {
            attempt: self.reconnect_attempts,
            delay,
        });
    }

    fn close(&mut self) {
        if self.manually_closed {
            return;
        }
        self.manually_closed = true;
        self.timers.stop_open_loops();
        self.timers.reconnect = None;
        debug!("Session {} closing", self.identity);

        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Open(link) => {
                link.close_gracefully(CloseReason::normal());
                self.on_closed(CloseCause::Manual);
            }
            Phase::Connecting(attempt) => {
                attempt.abort();
                self.on_closed(CloseCause::Manual);
            }
            Phase::Idle => self.terminate(TerminalReason::ManualClose),
        }
    }

    fn terminate(&mut self, reason: TerminalReason) {
        self.timers = Timers::default();
        if reason == TerminalReason::ManualClose {
            self.finished = true;
        }
        self.publish(SessionState::Terminated(reason));
    }

    fn take_link(&mut self) -> Option<Link> {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Open(link) => Some(link),
            other => {
                self.phase = other;
                None
            }
        }
    }

    fn publish(&self, state: SessionState) {
        self.sync_stats();
        debug!("Session {} is {}", self.identity, state);
        self.state.send_replace(state);
    }

    fn sync_stats(&self) {
        let mut stats = self.stats.write();
        stats.pending_requests = self.pending.len();
        stats.heartbeat_running = self.timers.heartbeat.is_some();
        stats.sweep_running = self.timers.sweep.is_some();
    }
}
