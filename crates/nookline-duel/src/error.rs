//! Error types for the challenge layer.

use crate::ChallengeState;

/// Errors for locally initiated challenge operations.
///
/// These cover misuse of the slot by the local UI; inbound frames that
/// don't fit the current state are dropped with a log instead, since the
/// network owes us no ordering guarantees.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    /// A challenge is already outstanding in the slot.
    #[error("a challenge is already outstanding ({0})")]
    Busy(ChallengeState),

    /// Players cannot challenge themselves.
    #[error("cannot challenge yourself")]
    SelfChallenge,

    /// Accept/decline called with no incoming challenge pending.
    #[error("no incoming challenge to answer")]
    NoIncoming,

    /// Cancel called with no outgoing challenge pending.
    #[error("no outgoing challenge to cancel")]
    NoOutgoing,
}
