//! Remote entity store and position interpolation for Nookline.
//!
//! Peers send discrete position snapshots a few times a second; the render
//! loop runs at 60 Hz. This crate bridges the two: [`RemoteEntityStore`]
//! keeps one [`RemoteEntity`] per peer and, on every [`tick`], eases each
//! entity's displayed position toward the last snapshot it received.
//!
//! The interpolation is cosmetic dead reckoning. It never feeds back into
//! game logic — challenges and battles only ever see snapshot data.
//!
//! # Ownership
//!
//! The store is the single owner of remote-entity state. Network dispatch
//! writes through [`RemoteEntityStore::apply_update`], the render loop
//! mutates only through [`RemoteEntityStore::tick`] and reads through
//! [`RemoteEntityStore::entities`]. With one owner there is no cross-thread
//! hazard even when the host embeds this in a parallel runtime — callers
//! serialize access with whatever lock wraps the store.

use std::collections::HashMap;

use nookline_protocol::{Animation, PlayerState};
use tracing::{debug, trace};

/// Fraction of the remaining distance covered per tick.
pub const LERP_STEP: f32 = 0.2;

/// Remaining axis distance below which the entity snaps onto its target.
/// Without the snap, the exponential ease-in never actually arrives.
pub const SNAP_THRESHOLD: f32 = 1.0;

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D position in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ---------------------------------------------------------------------------
// RemoteEntity
// ---------------------------------------------------------------------------

/// One tracked peer: where they're drawn now, where their last snapshot
/// says they are, and how their sprite should look.
#[derive(Debug, Clone)]
pub struct RemoteEntity {
    pub username: String,
    /// Displayed position, eased toward `target` each tick.
    pub current: Vec2,
    /// Last snapshot position received from the network.
    pub target: Vec2,
    pub animation: Animation,
    pub flip_x: bool,
    pub scale: f32,
}

impl RemoteEntity {
    fn from_snapshot(username: &str, state: &PlayerState) -> Self {
        let pos = Vec2::new(state.x, state.y);
        Self {
            username: username.to_string(),
            current: pos,
            target: pos,
            animation: state.animation,
            flip_x: state.flip_x,
            scale: state.scale,
        }
    }

    /// Remaining distance between displayed and snapshot position.
    pub fn remaining(&self) -> f32 {
        self.current.distance(self.target)
    }

    /// Eases one axis toward its target, snapping inside the threshold.
    fn step_axis(current: &mut f32, target: f32) {
        let distance = target - *current;
        if distance.abs() > SNAP_THRESHOLD {
            *current += distance * LERP_STEP;
        } else {
            *current = target;
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteEntityStore
// ---------------------------------------------------------------------------

/// All remote peers, keyed by username.
///
/// Entities are created on the first snapshot for an unknown name and
/// removed only by an explicit disconnect notice. A peer that silently
/// stops sending leaves a frozen entity behind — a known limitation of the
/// broadcast protocol, kept visible rather than masked with a timeout.
#[derive(Debug, Default)]
pub struct RemoteEntityStore {
    entities: HashMap<String, RemoteEntity>,
}

impl RemoteEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a peer from a position snapshot.
    ///
    /// An unseen username is created in place (`current == target`, no
    /// slide-in from the origin). For a known peer only the target and pose
    /// are overwritten; the displayed position keeps easing from wherever
    /// it currently is.
    pub fn apply_update(&mut self, username: &str, state: &PlayerState) {
        match self.entities.get_mut(username) {
            Some(entity) => {
                entity.target = Vec2::new(state.x, state.y);
                entity.animation = state.animation;
                entity.flip_x = state.flip_x;
                entity.scale = state.scale;
            }
            None => {
                debug!(username, x = state.x, y = state.y, "tracking new peer");
                self.entities.insert(
                    username.to_string(),
                    RemoteEntity::from_snapshot(username, state),
                );
            }
        }
    }

    /// Seeds the store from the initial world snapshot the server sends
    /// right after authentication. Existing entries are updated in place,
    /// so a mid-session snapshot (reconnect) doesn't teleport anyone.
    pub fn apply_world_snapshot(&mut self, players: &HashMap<String, PlayerState>) {
        debug!(players = players.len(), "applying world snapshot");
        for (username, state) in players {
            self.apply_update(username, state);
        }
    }

    /// Removes a peer after a disconnect notice.
    ///
    /// Returns `true` if the peer was tracked.
    pub fn remove(&mut self, username: &str) -> bool {
        let removed = self.entities.remove(username).is_some();
        if removed {
            debug!(username, "peer removed");
        }
        removed
    }

    /// Advances every entity one interpolation step.
    ///
    /// Each axis moves [`LERP_STEP`] of its remaining distance, snapping
    /// exactly onto the target once the remainder is within
    /// [`SNAP_THRESHOLD`]. The step is per-invocation, not time-scaled:
    /// the source protocol ties smoothing to the render frame rate.
    pub fn tick(&mut self) {
        for entity in self.entities.values_mut() {
            let (cur, target) = (&mut entity.current, entity.target);
            RemoteEntity::step_axis(&mut cur.x, target.x);
            RemoteEntity::step_axis(&mut cur.y, target.y);
        }
        trace!(entities = self.entities.len(), "interpolation tick");
    }

    /// Looks up a peer by username.
    pub fn get(&self, username: &str) -> Option<&RemoteEntity> {
        self.entities.get(username)
    }

    /// Iterates all tracked peers, for the per-frame render poll.
    pub fn entities(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    /// Number of tracked peers.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no peers are tracked.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
