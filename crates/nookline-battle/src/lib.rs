//! Turn-based battle resolution for Nookline.
//!
//! Battles run on the challenger's client from the stat payloads delivered
//! in the server's kickoff frame. The crate splits three concerns:
//!
//! - [`calculate_damage`] / [`determine_turn_order`] — pure combat math
//! - [`BattleState`] — the phase machine, one atomic transition per call
//! - [`BattleEngine`] — the timed driver that paces transitions for
//!   presentation and publishes `(phase, snapshot)` events
//!
//! Determinism: given the combatants and an RNG seed, a battle's entire
//! log is fixed — timing only spaces out when observers hear about it.

mod combat;
mod engine;
mod state;

pub use combat::{
    AttackOutcome, CRIT_MULTIPLIER, Combatant, Side, calculate_damage, determine_turn_order,
};
pub use engine::{BattleEngine, BattleEvent, BattleEvents, BattleTiming};
pub use state::{BattleOutcome, BattlePhase, BattleSnapshot, BattleState};
