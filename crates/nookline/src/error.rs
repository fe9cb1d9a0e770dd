//! Unified error type for the Nookline client core.

use nookline_duel::ChallengeError;
use nookline_protocol::ProtocolError;
use nookline_session::{SessionError, TransportError};

/// Top-level error that wraps all layer-specific errors.
///
/// Callers of the `nookline` meta-crate deal with this single type; the
/// `#[from]` impls let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NooklineError {
    /// A transport-level error (dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (the manager has been torn down).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A challenge-slot misuse (busy, nothing pending, self-challenge).
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
}
