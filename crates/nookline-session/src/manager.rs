//! The connection manager: one persistent, authenticated game socket.
//!
//! [`ConnectionManager`] is a cheap handle; the work happens in a spawned
//! actor task that owns the [`Session`] and the live socket. Commands flow
//! in over an unbounded channel, decoded frames flow out to subscribers,
//! and lifecycle changes flow out as [`SessionEvent`]s.
//!
//! The single actor loop is what makes the ordering guarantees cheap:
//! inbound frames dispatch in network-arrival order, outbound frames
//! transmit in enqueue order, and the pre-auth queue drains completely
//! before any later send — no locks, because nothing runs concurrently
//! with anything else.
//!
//! # Lifecycle
//!
//! ```text
//! dial ──ok──→ auth frame ──ack──→ authenticated (queue drains)
//!   │                │                   │
//!   │              error                drop
//!   │                ▼                   ▼
//!   └──err──→ backoff (fixed interval, bounded attempts) ──→ redial
//!                    │
//!                    ├─ attempts spent → Unreachable  (terminal)
//!                    └─ "Authentication failed" → Unauthenticated
//!                                                 (terminal, never retried)
//! ```
//!
//! Teardown is a hard contract: dropping the handle aborts the actor, which
//! cancels any pending backoff timer and releases the socket. No callback
//! fires against a torn-down session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nookline_protocol::{
    AUTH_FAILED_ERROR, AuthFrame, ClientFrame, Codec, Inbound, JsonCodec, ServerFrame,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{Connection, Dialer, Session, SessionConfig, SessionError, SessionEvent};

/// Counter for subscription ids, unique across all managers.
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Receiver half of the lifecycle event stream.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

enum Command {
    Send(ClientFrame),
    Subscribe(u64, mpsc::UnboundedSender<ServerFrame>),
    Unsubscribe(u64),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running connection actor.
pub struct ConnectionManager {
    cmd_tx: mpsc::UnboundedSender<Command>,
    authenticated: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawns the connection actor and begins dialing immediately.
    ///
    /// Never fails: transport trouble feeds the reconnect path and is
    /// reported through the returned [`SessionEvents`] stream, not to the
    /// caller.
    pub fn connect<D: Dialer>(
        dialer: D,
        endpoint: impl Into<String>,
        token: Option<String>,
        config: SessionConfig,
    ) -> (Self, SessionEvents) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let authenticated = Arc::new(AtomicBool::new(false));

        let actor = ConnectionActor {
            dialer,
            session: Session::new(endpoint, token),
            config,
            codec: JsonCodec,
            cmd_rx,
            event_tx,
            subscribers: Vec::new(),
            authenticated: Arc::clone(&authenticated),
        };
        let task = tokio::spawn(actor.run());

        (
            Self {
                cmd_tx,
                authenticated,
                task: Some(task),
            },
            event_rx,
        )
    }

    /// Queues a frame for transmission.
    ///
    /// Transmits immediately once authenticated; before that — including
    /// before any socket exists at all — the frame waits in the session's
    /// FIFO queue. Nothing is dropped silently.
    ///
    /// # Errors
    /// [`SessionError::Closed`] only after the manager has been shut down.
    pub fn send(&self, frame: ClientFrame) -> Result<(), SessionError> {
        self.cmd_tx
            .send(Command::Send(frame))
            .map_err(|_| SessionError::Closed)
    }

    /// Registers a new inbound-frame subscriber.
    ///
    /// Every decoded, non-control frame is delivered to every live
    /// subscriber in network-arrival order; subscribers registered earlier
    /// are notified first for each frame. Dropping the [`Subscription`]
    /// unregisters it.
    ///
    /// # Errors
    /// [`SessionError::Closed`] only after the manager has been shut down.
    pub fn subscribe(&self) -> Result<Subscription, SessionError> {
        let id = NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.cmd_tx
            .send(Command::Subscribe(id, tx))
            .map_err(|_| SessionError::Closed)?;
        Ok(Subscription {
            id,
            rx,
            cmd_tx: self.cmd_tx.clone(),
        })
    }

    /// Whether the current socket has completed the auth handshake.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Gracefully stops the actor: closes the socket and cancels any
    /// pending reconnect timer, then waits for the task to finish.
    /// Idempotent; later handle calls report [`SessionError::Closed`].
    pub async fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // Drop is synchronous, so the graceful path isn't available here;
        // aborting the actor still upholds the teardown contract — the
        // backoff timer and the socket listener die with the task.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A registered inbound-frame stream. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<ServerFrame>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    /// Receives the next frame, or `None` once the manager is gone.
    pub async fn recv(&mut self) -> Option<ServerFrame> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Unsubscribe(self.id));
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Why the connected loop ended.
enum LoopExit {
    /// Shutdown requested or every handle dropped.
    Shutdown,
    /// The socket failed or closed; take the reconnect path.
    TransportDrop,
    /// The server said [`AUTH_FAILED_ERROR`]; terminal, never retried.
    FatalAuth,
}

struct ConnectionActor<D: Dialer> {
    dialer: D,
    session: Session,
    config: SessionConfig,
    codec: JsonCodec,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Live subscribers in registration order.
    subscribers: Vec<(u64, mpsc::UnboundedSender<ServerFrame>)>,
    authenticated: Arc<AtomicBool>,
}

impl<D: Dialer> ConnectionActor<D> {
    async fn run(mut self) {
        info!(endpoint = %self.session.endpoint, "connection manager started");

        loop {
            match self.dialer.dial(&self.session.endpoint).await {
                Ok(mut conn) => {
                    self.session.reconnect_attempts = 0;
                    info!("socket open");
                    self.emit(SessionEvent::Connected);

                    // The auth token is the first frame on every socket.
                    if let Some(token) = self.session.token.clone() {
                        if let Err(e) = self.transmit(&mut conn, &AuthFrame { token }).await {
                            warn!(error = %e, "failed to send auth frame");
                            if !self.backoff().await {
                                return;
                            }
                            continue;
                        }
                    }

                    match self.serve(&mut conn).await {
                        LoopExit::Shutdown => {
                            conn.close().await;
                            info!("connection manager shut down");
                            return;
                        }
                        LoopExit::FatalAuth => {
                            conn.close().await;
                            self.set_authenticated(false);
                            warn!("authentication failed, session terminated");
                            self.emit(SessionEvent::Unauthenticated);
                            return;
                        }
                        LoopExit::TransportDrop => {
                            self.set_authenticated(false);
                            if !self.backoff().await {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, "dial failed");
                    if !self.backoff().await {
                        return;
                    }
                }
            }
        }
    }

    /// The connected loop: multiplexes handle commands and socket frames.
    async fn serve(&mut self, conn: &mut D::Conn) -> LoopExit {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(frame)) => {
                        if self.session.authenticated {
                            if let Err(e) = self.transmit(conn, &frame).await {
                                warn!(error = %e, "send failed, dropping connection");
                                return LoopExit::TransportDrop;
                            }
                        } else {
                            debug!("not yet authenticated, queueing outbound frame");
                            self.session.outbound_queue.push_back(frame);
                        }
                    }
                    Some(Command::Subscribe(id, tx)) => self.subscribers.push((id, tx)),
                    Some(Command::Unsubscribe(id)) => {
                        self.subscribers.retain(|(sid, _)| *sid != id);
                    }
                    Some(Command::Shutdown) | None => return LoopExit::Shutdown,
                },
                inbound = conn.recv() => match inbound {
                    Ok(Some(data)) => {
                        if let Some(exit) = self.handle_inbound(conn, &data).await {
                            return exit;
                        }
                    }
                    Ok(None) => {
                        info!("connection closed by server");
                        return LoopExit::TransportDrop;
                    }
                    Err(e) => {
                        warn!(error = %e, "receive error");
                        return LoopExit::TransportDrop;
                    }
                },
            }
        }
    }

    /// Decodes and routes one raw inbound frame. Returns `Some` when the
    /// connected loop must end.
    async fn handle_inbound(&mut self, conn: &mut D::Conn, data: &[u8]) -> Option<LoopExit> {
        let inbound: Inbound = match self.codec.decode(data) {
            Ok(inbound) => inbound,
            Err(e) => {
                // Malformed frames are dropped; the loop survives them.
                warn!(error = %e, "undecodable frame dropped");
                return None;
            }
        };

        match inbound {
            Inbound::Error { error } if error == AUTH_FAILED_ERROR => Some(LoopExit::FatalAuth),

            Inbound::Error { error } => {
                warn!(%error, "server error");
                self.emit(SessionEvent::ServerError(error));
                None
            }

            Inbound::AuthAck { authenticated } => {
                if authenticated && !self.session.authenticated {
                    self.set_authenticated(true);
                    info!(
                        queued = self.session.outbound_queue.len(),
                        "authenticated"
                    );
                    self.emit(SessionEvent::Authenticated);

                    // Drain strictly in arrival order before any newer
                    // send: a Send racing in right now sits behind us in
                    // cmd_rx and is only handled once this loop finishes.
                    while let Some(frame) = self.session.outbound_queue.pop_front() {
                        if let Err(e) = self.transmit(conn, &frame).await {
                            warn!(error = %e, "send failed while draining queue");
                            // Keep the frame for the next session.
                            self.session.outbound_queue.push_front(frame);
                            return Some(LoopExit::TransportDrop);
                        }
                    }
                }
                None
            }

            Inbound::Frame(frame) => {
                self.dispatch(frame);
                None
            }
        }
    }

    /// Delivers a frame to every live subscriber in registration order.
    fn dispatch(&mut self, frame: ServerFrame) {
        self.subscribers.retain(|(_, tx)| !tx.is_closed());
        for (_, tx) in &self.subscribers {
            let _ = tx.send(frame.clone());
        }
    }

    /// Waits out the reconnect interval, still servicing handle commands
    /// so sends keep queueing while the link is down. Returns `false` when
    /// the attempt budget is spent or shutdown was requested.
    async fn backoff(&mut self) -> bool {
        if self.session.reconnect_attempts >= self.config.max_reconnect_attempts {
            warn!(
                attempts = self.session.reconnect_attempts,
                "max reconnect attempts reached, giving up"
            );
            self.emit(SessionEvent::Unreachable);
            return false;
        }
        self.session.reconnect_attempts += 1;
        info!(
            attempt = self.session.reconnect_attempts,
            max = self.config.max_reconnect_attempts,
            "scheduling reconnect"
        );
        self.emit(SessionEvent::Disconnected {
            attempt: self.session.reconnect_attempts,
        });

        let deadline = tokio::time::Instant::now() + self.config.reconnect_interval;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(frame)) => {
                        self.session.outbound_queue.push_back(frame);
                    }
                    Some(Command::Subscribe(id, tx)) => self.subscribers.push((id, tx)),
                    Some(Command::Unsubscribe(id)) => {
                        self.subscribers.retain(|(sid, _)| *sid != id);
                    }
                    Some(Command::Shutdown) | None => return false,
                },
            }
        }
    }

    async fn transmit<T: serde::Serialize>(
        &mut self,
        conn: &mut D::Conn,
        value: &T,
    ) -> Result<(), crate::TransportError> {
        match self.codec.encode(value) {
            Ok(bytes) => conn.send(&bytes).await,
            Err(e) => {
                // Encoding our own frames can't fail in practice; a bug
                // here shouldn't take the connection down.
                warn!(error = %e, "failed to encode outbound frame");
                Ok(())
            }
        }
    }

    fn set_authenticated(&mut self, value: bool) {
        self.session.authenticated = value;
        self.authenticated.store(value, Ordering::Release);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}
