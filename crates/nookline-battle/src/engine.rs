//! The timed battle driver.
//!
//! Wraps the pure [`BattleState`] machine in a Tokio task that holds each
//! phase for its configured duration before advancing. The delays pace
//! *event emission* only — the damage math itself is instantaneous and
//! fully determined by the state machine plus the RNG.
//!
//! Dropping a [`BattleEngine`] aborts the driver task, cancelling any
//! pending phase timer. That teardown contract is hard: no phase event is
//! ever emitted for an engine the owner has released.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::{BattlePhase, BattleSnapshot, BattleState, Combatant};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Phase durations. The defaults reproduce the reference presentation:
/// a 1 s attack wind-up, a 500 ms hit-reaction, and attacks starting 2 s
/// apart (`windup + recovery + idle`).
#[derive(Debug, Clone)]
pub struct BattleTiming {
    /// How long `Attacking` holds before the impact lands.
    pub windup: Duration,
    /// Hit-reaction beat after an impact.
    pub recovery: Duration,
    /// Quiet gap after the recovery beat, before the next attack or round.
    pub idle: Duration,
}

impl Default for BattleTiming {
    fn default() -> Self {
        Self {
            windup: Duration::from_millis(1000),
            recovery: Duration::from_millis(500),
            idle: Duration::from_millis(500),
        }
    }
}

impl BattleTiming {
    /// Zero delays everywhere. Resolves a battle as fast as the executor
    /// can step it; meant for tests and headless simulation.
    pub fn instant() -> Self {
        Self {
            windup: Duration::ZERO,
            recovery: Duration::ZERO,
            idle: Duration::ZERO,
        }
    }

    /// How long the given phase holds before the machine advances out of
    /// it. `Impact` and the bookkeeping phases are instantaneous.
    pub fn dwell(&self, phase: &BattlePhase) -> Duration {
        match phase {
            BattlePhase::Attacking(_) => self.windup,
            BattlePhase::Recovering(_) => self.recovery + self.idle,
            _ => Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One phase transition, paired with the state snapshot taken right after
/// it. The rendering collaborator binds to the stream of these.
#[derive(Debug, Clone)]
pub struct BattleEvent {
    pub phase: BattlePhase,
    pub snapshot: BattleSnapshot,
}

/// Receiver half of a battle's event stream.
pub type BattleEvents = mpsc::UnboundedReceiver<BattleEvent>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Handle to a running battle driver.
///
/// The latest snapshot is observable at any time through
/// [`snapshot`](Self::snapshot); transition events arrive on the
/// [`BattleEvents`] stream returned by [`spawn`](Self::spawn).
pub struct BattleEngine {
    snapshot_rx: watch::Receiver<BattleSnapshot>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl BattleEngine {
    /// Starts a battle with an OS-seeded generator.
    pub fn spawn(c1: Combatant, c2: Combatant, timing: BattleTiming) -> (Self, BattleEvents) {
        Self::spawn_with_rng(c1, c2, timing, StdRng::from_os_rng())
    }

    /// Starts a battle with a caller-provided generator. A seeded RNG
    /// replays the identical battle, which the tests rely on.
    pub fn spawn_with_rng(
        c1: Combatant,
        c2: Combatant,
        timing: BattleTiming,
        mut rng: impl Rng + Send + 'static,
    ) -> (Self, BattleEvents) {
        let state = BattleState::new(c1, c2, &mut rng);
        info!(
            p1 = %state.combatant(crate::Side::P1).name,
            p2 = %state.combatant(crate::Side::P2).name,
            "battle started"
        );

        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(drive(state, timing, rng, snapshot_tx, event_tx));

        (
            Self {
                snapshot_rx,
                task: Some(task),
            },
            event_rx,
        )
    }

    /// The most recent snapshot, including the full log so far.
    pub fn snapshot(&self) -> BattleSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Returns `true` once the driver has reached a terminal phase.
    pub fn is_finished(&self) -> bool {
        self.snapshot_rx.borrow().phase.is_terminal()
    }

    /// Stops the driver immediately, cancelling any pending phase timer.
    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("battle driver aborted");
        }
    }
}

impl Drop for BattleEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The driver loop: hold the current phase for its dwell, advance once,
/// publish, repeat until terminal.
async fn drive(
    mut state: BattleState,
    timing: BattleTiming,
    mut rng: impl Rng,
    snapshot_tx: watch::Sender<BattleSnapshot>,
    event_tx: mpsc::UnboundedSender<BattleEvent>,
) {
    loop {
        let dwell = timing.dwell(&state.phase());
        if !dwell.is_zero() {
            tokio::time::sleep(dwell).await;
        }

        let phase = state.advance(&mut rng);
        let snapshot = state.snapshot();
        let _ = snapshot_tx.send(snapshot.clone());

        if event_tx.send(BattleEvent { phase, snapshot }).is_err() {
            // Nobody is watching; a battle with no observer has no
            // reason to keep ticking.
            debug!("battle event receiver dropped, stopping driver");
            return;
        }

        if phase.is_terminal() {
            info!(outcome = ?state.outcome(), "battle ended");
            return;
        }
    }
}
