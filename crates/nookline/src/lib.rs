//! # Nookline
//!
//! Client core for a browser battler: players roam a shared map, challenge
//! each other by name, and fight scripted turn-based battles.
//!
//! The core owns the persistent game socket (auth, buffering, bounded
//! reconnects), smooths remote-peer movement, runs the challenge handshake,
//! and resolves battles deterministically from the server's stat payloads.
//! Rendering, wallet flows, and HTTP login stay outside: hosts feed in a
//! token, poll the entity store each frame, and react to [`GameEvent`]s.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use nookline::{ClientConfig, GameClient, GameEvent};
//!
//! # async fn run() {
//! let config = ClientConfig::new("ws://localhost:6789", "alice").token("jwt…");
//! let (client, mut events) = GameClient::connect(config);
//!
//! // Render loop: smooth and draw remote peers.
//! client.world().lock().tick();
//!
//! // Event loop: react to challenges, battles, connection state.
//! while let Some(event) = events.recv().await {
//!     match event {
//!         GameEvent::Challenge(challenge) => { /* show the popup */ }
//!         GameEvent::BattlePhase(change) => { /* drive the arena */ }
//!         _ => {}
//!     }
//! }
//! # }
//! ```

mod client;
mod error;
mod event;

pub use client::{ClientConfig, GameClient};
pub use error::NooklineError;
pub use event::{EntityEvent, GameEvent, GameEvents};

// Re-export the layer types hosts interact with, so most consumers depend
// on this crate alone.
pub use nookline_battle::{
    BattleEvent, BattleOutcome, BattlePhase, BattleSnapshot, BattleTiming, Combatant, Side,
};
pub use nookline_duel::{Challenge, ChallengeState, ChallengeStatus};
pub use nookline_protocol::{Animation, PlayerState, ServerFrame, Stats};
pub use nookline_session::{SessionConfig, SessionEvent};
pub use nookline_world::{RemoteEntity, RemoteEntityStore};

/// Installs a default `tracing` subscriber honoring `RUST_LOG`.
///
/// Hosts with their own subscriber should skip this; calling it twice is
/// harmless (the second install is ignored).
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
