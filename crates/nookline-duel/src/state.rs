//! Challenge state machine and hook payloads.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChallengeState
// ---------------------------------------------------------------------------

/// The client's challenge slot.
///
/// One challenge can be outstanding at a time, in either direction:
///
/// ```text
///        ┌──(initiate)──→ PendingOutgoing ──(accepted)──→ Resolved
///        │                      │
///  Idle ─┤                      └─(declined / cancel / response)──→ Idle
///        │
///        └──(request)───→ PendingIncoming ──(accept / decline)──→ Resolved
///                               │
///                               └─(peer cancelled)──→ Idle
/// ```
///
/// `Resolved` means agreement was reached; it is NOT the battle. Kickoff is
/// a separate server `fight_start`, so a late stat payload never races the
/// handshake. The owner calls [`reset`](crate::ChallengeTracker::reset) once
/// the battle (or its failure notice) is done with the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeState {
    /// No challenge outstanding.
    Idle,
    /// We challenged `to` and are waiting for their answer.
    PendingOutgoing { to: String },
    /// `from` challenged us and the answer is ours to give.
    PendingIncoming { from: String },
    /// Agreement reached with `with`; waiting on kickoff or teardown.
    Resolved { with: String },
}

impl ChallengeState {
    /// Returns `true` if a new challenge may start from this state.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns `true` if we are waiting on the peer's answer.
    pub fn is_pending_outgoing(&self) -> bool {
        matches!(self, Self::PendingOutgoing { .. })
    }

    /// Returns `true` if the answer is ours to give.
    pub fn is_pending_incoming(&self) -> bool {
        matches!(self, Self::PendingIncoming { .. })
    }

    /// Returns `true` if agreement was reached and the slot awaits reset.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Cancellation is only valid for the side that sent the request.
    pub fn can_cancel(&self) -> bool {
        self.is_pending_outgoing()
    }
}

impl std::fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PendingOutgoing { to } => write!(f, "pending-outgoing({to})"),
            Self::PendingIncoming { from } => write!(f, "pending-incoming({from})"),
            Self::Resolved { with } => write!(f, "resolved({with})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Challenge — hook payload
// ---------------------------------------------------------------------------

/// How a challenge ended up, from this client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

/// A challenge snapshot handed to the UI collaborator.
///
/// `from` is always the challenger and `to` the challenged player,
/// regardless of which side this client is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub from: String,
    pub to: String,
    pub status: ChallengeStatus,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ChallengeState::Idle.is_idle());

        let out = ChallengeState::PendingOutgoing { to: "bob".into() };
        assert!(out.is_pending_outgoing());
        assert!(out.can_cancel());
        assert!(!out.is_idle());

        let inc = ChallengeState::PendingIncoming { from: "bob".into() };
        assert!(inc.is_pending_incoming());
        assert!(!inc.can_cancel());

        let resolved = ChallengeState::Resolved { with: "bob".into() };
        assert!(resolved.is_resolved());
        assert!(!resolved.can_cancel());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ChallengeState::Idle.to_string(), "idle");
        assert_eq!(
            ChallengeState::PendingOutgoing { to: "bob".into() }.to_string(),
            "pending-outgoing(bob)"
        );
    }
}
