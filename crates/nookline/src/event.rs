//! The collaborator-facing event surface.
//!
//! The rendering host binds to one stream of [`GameEvent`]s; the core
//! never calls into rendering APIs directly. Position smoothing is the
//! exception to the event flow — the host polls the entity store each
//! frame instead, since per-frame events would just be a worse poll.

use nookline_battle::BattleEvent;
use nookline_duel::Challenge;
use nookline_protocol::PlayerState;
use nookline_session::SessionEvent;
use tokio::sync::mpsc;

/// Receiver half of the game event stream.
pub type GameEvents = mpsc::UnboundedReceiver<GameEvent>;

/// A change in remote-entity state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// A peer appeared or moved; `state` is the raw snapshot (the store
    /// holds the smoothed position).
    Updated { username: String, state: PlayerState },
    /// A peer disconnected and was dropped from the store.
    Removed { username: String },
}

/// Everything the core reports to its host.
#[derive(Debug)]
pub enum GameEvent {
    /// Connection lifecycle: open, authenticated, reconnecting, terminal.
    Session(SessionEvent),
    /// Remote-entity changes (also observable by polling the store).
    Entity(EntityEvent),
    /// Challenge handshake progress.
    Challenge(Challenge),
    /// A battle phase transition with its snapshot.
    BattlePhase(BattleEvent),
    /// A user-visible notification (domain errors, fight notices).
    Notice(String),
}
