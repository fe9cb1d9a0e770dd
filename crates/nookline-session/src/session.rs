//! Session types: the data that represents one logical connection.
//!
//! A session outlives any individual socket. The socket may drop and be
//! redialed many times; the session keeps the endpoint, the auth token, the
//! attempt counter, and — crucially — the outbound queue, so frames sent
//! while the link is down or unauthenticated are never silently lost.

use std::collections::VecDeque;
use std::time::Duration;

use nookline_protocol::ClientFrame;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Reconnection policy.
///
/// The defaults match the reference client: a fixed 5-second interval and
/// an initial connect plus up to 10 reconnect attempts before the session
/// is declared unreachable.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed backoff between reconnect attempts.
    pub reconnect_interval: Duration,
    /// Reconnect attempts before giving up. 0 disables reconnection.
    pub max_reconnect_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One logical connection to the game server.
///
/// `authenticated` flips to `true` exactly once per successful handshake
/// (and back to `false` whenever the socket drops). The outbound queue is
/// strictly FIFO: frames queued while unauthenticated drain in arrival
/// order ahead of anything sent afterwards.
#[derive(Debug)]
pub struct Session {
    pub endpoint: String,
    /// Auth token from the login collaborator; `None` connects anonymously
    /// (the server will never ack, and sends will queue indefinitely).
    pub token: Option<String>,
    pub authenticated: bool,
    /// Consecutive failed reconnects since the last successful open.
    pub reconnect_attempts: u32,
    pub outbound_queue: VecDeque<ClientFrame>,
}

impl Session {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            authenticated: false,
            reconnect_attempts: 0,
            outbound_queue: VecDeque::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Connection lifecycle events surfaced to the collaborator.
///
/// Distinct from game frames: subscribers get [`ServerFrame`]s
/// (`nookline_protocol::ServerFrame`), while these describe the link
/// itself. The two terminal events mean the manager has stopped for good —
/// `Unauthenticated` is the cue to send the user back to login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The socket opened. Authentication is still pending.
    Connected,
    /// The server acknowledged our token; queued frames have drained.
    Authenticated,
    /// The socket dropped; reconnect attempt `attempt` is scheduled.
    Disconnected { attempt: u32 },
    /// The attempt budget is spent. Terminal.
    Unreachable,
    /// The server rejected our token. Terminal, never retried.
    Unauthenticated,
    /// A non-fatal server error frame (e.g. an auth timeout notice).
    ServerError(String),
}

impl SessionEvent {
    /// Returns `true` for events after which no further connection attempt
    /// will ever be made.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unreachable | Self::Unauthenticated)
    }
}

// =========================================================================
// Tests
// =========================================================================
