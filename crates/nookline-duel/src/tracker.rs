//! The challenge tracker: drives the handshake from both sides.
//!
//! Pure state — no sockets, no timers. Local actions return the
//! [`ClientFrame`] to transmit; inbound frames go through
//! [`ChallengeTracker::on_frame`], which returns the [`Challenge`] snapshot
//! to surface to the UI (if the frame concerned us at all). The caller owns
//! delivery in both directions, which keeps every transition synchronously
//! testable.

use nookline_protocol::{ClientFrame, ServerFrame};
use tracing::{debug, info, warn};

use crate::{Challenge, ChallengeError, ChallengeState, ChallengeStatus};

/// Per-client challenge handshake state machine.
pub struct ChallengeTracker {
    username: String,
    state: ChallengeState,
}

impl ChallengeTracker {
    /// Creates an idle tracker for the local player.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            state: ChallengeState::Idle,
        }
    }

    /// The local player's name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current slot state.
    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    // -- Local actions ----------------------------------------------------

    /// Challenges `target`. Valid only from `Idle`.
    ///
    /// # Errors
    /// [`ChallengeError::SelfChallenge`] for our own name,
    /// [`ChallengeError::Busy`] while another challenge is outstanding.
    pub fn initiate(&mut self, target: &str) -> Result<ClientFrame, ChallengeError> {
        if target == self.username {
            return Err(ChallengeError::SelfChallenge);
        }
        if !self.state.is_idle() {
            return Err(ChallengeError::Busy(self.state.clone()));
        }

        self.state = ChallengeState::PendingOutgoing {
            to: target.to_string(),
        };
        info!(%target, "challenge sent");
        Ok(ClientFrame::ChallengeRequest {
            from: self.username.clone(),
            to: target.to_string(),
        })
    }

    /// Accepts the pending incoming challenge.
    ///
    /// Lands in `Resolved`: agreement only. The battle begins when the
    /// server's `fight_start` arrives with both stat payloads.
    ///
    /// # Errors
    /// [`ChallengeError::NoIncoming`] when nothing is pending.
    pub fn accept(&mut self) -> Result<ClientFrame, ChallengeError> {
        let ChallengeState::PendingIncoming { from } = &self.state else {
            return Err(ChallengeError::NoIncoming);
        };
        let challenger = from.clone();

        self.state = ChallengeState::Resolved {
            with: challenger.clone(),
        };
        info!(%challenger, "challenge accepted");
        Ok(ClientFrame::ChallengeAccept {
            from: self.username.clone(),
            to: challenger,
        })
    }

    /// Declines the pending incoming challenge, resolving the slot.
    ///
    /// # Errors
    /// [`ChallengeError::NoIncoming`] when nothing is pending.
    pub fn decline(&mut self) -> Result<ClientFrame, ChallengeError> {
        let ChallengeState::PendingIncoming { from } = &self.state else {
            return Err(ChallengeError::NoIncoming);
        };
        let challenger = from.clone();

        self.state = ChallengeState::Resolved {
            with: challenger.clone(),
        };
        info!(%challenger, "challenge declined");
        Ok(ClientFrame::ChallengeDecline {
            from: self.username.clone(),
            to: challenger,
        })
    }

    /// Withdraws our own outstanding challenge. Valid only from
    /// `PendingOutgoing`; resets straight to `Idle` with no other side
    /// effects.
    ///
    /// # Errors
    /// [`ChallengeError::NoOutgoing`] when we have nothing to withdraw.
    pub fn cancel(&mut self) -> Result<ClientFrame, ChallengeError> {
        let ChallengeState::PendingOutgoing { to } = &self.state else {
            return Err(ChallengeError::NoOutgoing);
        };
        let target = to.clone();

        self.state = ChallengeState::Idle;
        info!(%target, "challenge cancelled");
        Ok(ClientFrame::ChallengeCancel {
            from: self.username.clone(),
            to: target,
        })
    }

    /// Frees the slot. Called once the battle (or its failure notice) is
    /// finished with it — the equivalent of closing the battle window.
    pub fn reset(&mut self) {
        if !self.state.is_idle() {
            debug!(state = %self.state, "challenge slot reset");
            self.state = ChallengeState::Idle;
        }
    }

    // -- Inbound frames ---------------------------------------------------

    /// Feeds one inbound frame through the state machine.
    ///
    /// Returns the [`Challenge`] snapshot to hand to the UI when the frame
    /// moved our slot; frames addressed to other players, or arriving in a
    /// state they don't fit, are ignored (logged, never an error — the
    /// network owes us no particular ordering).
    pub fn on_frame(&mut self, frame: &ServerFrame) -> Option<Challenge> {
        match frame {
            ServerFrame::ChallengeRequest { from, to } if to == &self.username => {
                if !self.state.is_idle() {
                    // One challenge window at a time; the requester's slot
                    // stays pending until they cancel or we free ours.
                    warn!(%from, state = %self.state, "challenge request while busy, ignoring");
                    return None;
                }
                self.state = ChallengeState::PendingIncoming { from: from.clone() };
                info!(%from, "challenge received");
                Some(Challenge {
                    from: from.clone(),
                    to: to.clone(),
                    status: ChallengeStatus::Pending,
                })
            }

            ServerFrame::ChallengeAccept { from, to } if to == &self.username => {
                match &self.state {
                    ChallengeState::PendingOutgoing { to: target } if target == from => {
                        self.state = ChallengeState::Resolved { with: from.clone() };
                        info!(by = %from, "our challenge was accepted");
                        Some(Challenge {
                            from: self.username.clone(),
                            to: from.clone(),
                            status: ChallengeStatus::Accepted,
                        })
                    }
                    _ => {
                        debug!(%from, state = %self.state, "unexpected challenge_accept, ignoring");
                        None
                    }
                }
            }

            ServerFrame::ChallengeDecline { from, to } if to == &self.username => {
                match &self.state {
                    ChallengeState::PendingOutgoing { to: target } if target == from => {
                        // A declined challenge frees the slot immediately.
                        self.state = ChallengeState::Idle;
                        info!(by = %from, "our challenge was declined");
                        Some(Challenge {
                            from: self.username.clone(),
                            to: from.clone(),
                            status: ChallengeStatus::Declined,
                        })
                    }
                    _ => {
                        debug!(%from, state = %self.state, "unexpected challenge_decline, ignoring");
                        None
                    }
                }
            }

            ServerFrame::ChallengeCancel { from, to } if to == &self.username => {
                match &self.state {
                    ChallengeState::PendingIncoming { from: challenger } if challenger == from => {
                        self.state = ChallengeState::Idle;
                        info!(by = %from, "incoming challenge withdrawn");
                        Some(Challenge {
                            from: from.clone(),
                            to: self.username.clone(),
                            status: ChallengeStatus::Cancelled,
                        })
                    }
                    _ => {
                        debug!(%from, state = %self.state, "unexpected challenge_cancel, ignoring");
                        None
                    }
                }
            }

            ServerFrame::ChallengeResponse { success, message } => {
                // Server couldn't forward our request (target offline).
                // Roll the slot back; the caller surfaces `message` as a
                // user-visible notice.
                if !success && self.state.is_pending_outgoing() {
                    debug!(%message, "challenge rolled back by server response");
                    self.state = ChallengeState::Idle;
                }
                None
            }

            _ => None,
        }
    }
}
