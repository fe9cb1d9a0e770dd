//! Challenge handshake for Nookline.
//!
//! A thin request/accept/decline/cancel protocol layered on the session's
//! typed frames. Agreement and kickoff are deliberately decoupled: accepting
//! a challenge resolves the handshake, but the battle itself starts only
//! when the server's `fight_start` payload arrives.
//!
//! # Key types
//!
//! - [`ChallengeTracker`] — the per-client state machine
//! - [`ChallengeState`] — the slot's lifecycle state
//! - [`Challenge`] / [`ChallengeStatus`] — snapshots for the UI hook

mod error;
mod state;
mod tracker;

pub use error::ChallengeError;
pub use state::{Challenge, ChallengeState, ChallengeStatus};
pub use tracker::ChallengeTracker;
