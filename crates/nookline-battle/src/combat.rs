//! Combat math: turn order and damage.
//!
//! Pure functions over combatant stats. Everything random takes
//! `&mut impl Rng` so callers decide between the OS generator and a seeded
//! one — battles replay exactly under a fixed seed, which is also how the
//! tests pin down outcomes.

use nookline_protocol::{FighterPayload, Stats};
use rand::Rng;

/// Damage multiplier on a critical hit.
pub const CRIT_MULTIPLIER: f64 = 1.5;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which corner of the arena a combatant occupies. `P1` is always the
/// `player1` of the kickoff payload, on both clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    P1,
    P2,
}

impl Side {
    /// The opposing side.
    pub fn other(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::P1 => 0,
            Side::P2 => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Combatant
// ---------------------------------------------------------------------------

/// An immutable view of one fighter: display name plus combat stats.
///
/// Built once from the kickoff payload; health lives in the battle state,
/// not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub name: String,
    pub stats: Stats,
}

impl Combatant {
    pub fn new(name: impl Into<String>, stats: Stats) -> Self {
        Self {
            name: name.into(),
            stats,
        }
    }

    /// Derives a combatant from one side of a `fight_start` payload.
    pub fn from_payload(payload: &FighterPayload) -> Self {
        Self {
            name: payload.username.clone(),
            stats: payload.fighter.meta.stats,
        }
    }
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

/// The result of a single attack roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    pub damage: i32,
    pub critical: bool,
}

/// Rolls one attack.
///
/// `base = max(0, Attack − Defense)`; a critical hit lands with probability
/// `critical_chance` and multiplies damage by [`CRIT_MULTIPLIER`], truncated
/// to a whole number. Damage is never negative.
pub fn calculate_damage(
    attacker: &Combatant,
    defender: &Combatant,
    rng: &mut impl Rng,
) -> AttackOutcome {
    let base = (attacker.stats.attack - defender.stats.defense).max(0);
    // Stats come from untrusted inscription JSON; clamp before rolling.
    let chance = attacker.stats.critical_chance.clamp(0.0, 1.0);
    let critical = rng.random_bool(chance);
    let damage = if critical {
        (base as f64 * CRIT_MULTIPLIER) as i32
    } else {
        base
    };
    AttackOutcome {
        damage: damage.max(0),
        critical,
    }
}

/// Decides who attacks first.
///
/// Strictly higher Speed goes first; an exact tie is an unweighted coin
/// flip. The order holds for the whole battle — it is rolled once at
/// kickoff and never recomputed.
pub fn determine_turn_order(c1: &Combatant, c2: &Combatant, rng: &mut impl Rng) -> [Side; 2] {
    if c1.stats.speed > c2.stats.speed {
        [Side::P1, Side::P2]
    } else if c2.stats.speed > c1.stats.speed {
        [Side::P2, Side::P1]
    } else if rng.random_bool(0.5) {
        [Side::P1, Side::P2]
    } else {
        [Side::P2, Side::P1]
    }
}

// =========================================================================
// Tests
// =========================================================================
