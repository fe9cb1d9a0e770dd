//! Integration tests for the remote entity store.
//!
//! Positions and thresholds mirror the reference client: 0.2 of the
//! remaining distance per tick, snap inside 1 unit.

use std::collections::HashMap;

use nookline_protocol::{Animation, PlayerState};
use nookline_world::{RemoteEntityStore, SNAP_THRESHOLD, Vec2};

// =========================================================================
// Helpers
// =========================================================================

fn snapshot(x: f32, y: f32) -> PlayerState {
    PlayerState {
        x,
        y,
        animation: Animation::Stand,
        flip_x: false,
        scale: 2.0,
    }
}

fn snapshot_with(x: f32, y: f32, animation: Animation, flip_x: bool, scale: f32) -> PlayerState {
    PlayerState {
        x,
        y,
        animation,
        flip_x,
        scale,
    }
}

// =========================================================================
// Creation and updates
// =========================================================================

#[test]
fn test_first_update_creates_entity_in_place() {
    let mut store = RemoteEntityStore::new();

    store.apply_update("bob", &snapshot(250.0, 425.0));

    let entity = store.get("bob").expect("entity should exist");
    // No slide-in from the origin: displayed == snapshot on creation.
    assert_eq!(entity.current, Vec2::new(250.0, 425.0));
    assert_eq!(entity.target, Vec2::new(250.0, 425.0));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_update_overwrites_target_but_not_current() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));

    store.apply_update("bob", &snapshot(100.0, 0.0));

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current, Vec2::new(0.0, 0.0));
    assert_eq!(entity.target, Vec2::new(100.0, 0.0));
}

#[test]
fn test_update_overwrites_pose_fields() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));

    store.apply_update("bob", &snapshot_with(0.0, 0.0, Animation::RunUp, true, 3.0));

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.animation, Animation::RunUp);
    assert!(entity.flip_x);
    assert_eq!(entity.scale, 3.0);
}

#[test]
fn test_entities_tracked_independently() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.apply_update("carol", &snapshot(500.0, 500.0));

    store.apply_update("bob", &snapshot(100.0, 0.0));
    store.tick();

    // Carol never moved; her position must be untouched.
    let carol = store.get("carol").unwrap();
    assert_eq!(carol.current, Vec2::new(500.0, 500.0));
}

// =========================================================================
// Interpolation
// =========================================================================

#[test]
fn test_tick_moves_fraction_of_remaining_distance() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.apply_update("bob", &snapshot(100.0, 50.0));

    store.tick();

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current.x, 20.0);
    assert_eq!(entity.current.y, 10.0);
}

#[test]
fn test_tick_monotonically_approaches_and_snaps_exactly() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.apply_update("bob", &snapshot(100.0, 0.0));

    let mut previous = store.get("bob").unwrap().remaining();
    assert_eq!(previous, 100.0);

    for _ in 0..100 {
        store.tick();
        let entity = store.get("bob").unwrap();
        let remaining = entity.remaining();

        // Distance shrinks every tick and the position never overshoots.
        assert!(remaining <= previous, "distance must not grow");
        assert!(entity.current.x <= 100.0, "must not overshoot the target");
        previous = remaining;
        if remaining == 0.0 {
            break;
        }
    }

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current, entity.target, "must land exactly on target");
}

#[test]
fn test_tick_snaps_inside_threshold() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.apply_update("bob", &snapshot(SNAP_THRESHOLD * 0.5, 0.0));

    store.tick();

    // Half a unit out: one tick snaps straight onto the target instead of
    // creeping 20% at a time forever.
    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current.x, SNAP_THRESHOLD * 0.5);
    assert_eq!(entity.remaining(), 0.0);
}

#[test]
fn test_axes_snap_independently() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    // X is within the snap threshold, Y is far away.
    store.apply_update("bob", &snapshot(0.5, 100.0));

    store.tick();

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current.x, 0.5, "near axis snaps");
    assert_eq!(entity.current.y, 20.0, "far axis keeps easing");
}

#[test]
fn test_retarget_mid_flight_redirects_easing() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.apply_update("bob", &snapshot(100.0, 0.0));
    store.tick(); // current.x == 20

    // Peer turned around before arriving.
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.tick();

    let entity = store.get("bob").unwrap();
    assert_eq!(entity.current.x, 16.0); // 20 - 20 * 0.2
    assert_eq!(entity.target.x, 0.0);
}

#[test]
fn test_tick_on_empty_store_is_noop() {
    let mut store = RemoteEntityStore::new();
    store.tick();
    assert!(store.is_empty());
}

// =========================================================================
// World snapshot and removal
// =========================================================================

#[test]
fn test_world_snapshot_seeds_all_peers() {
    let mut store = RemoteEntityStore::new();
    let mut players = HashMap::new();
    players.insert("bob".to_string(), snapshot(250.0, 425.0));
    players.insert("carol".to_string(), snapshot(10.0, 20.0));

    store.apply_world_snapshot(&players);

    assert_eq!(store.len(), 2);
    let bob = store.get("bob").unwrap();
    assert_eq!(bob.current, bob.target);

    // The render poll sees every tracked peer.
    let mut names: Vec<&str> = store.entities().map(|e| e.username.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["bob", "carol"]);
}

#[test]
fn test_world_snapshot_does_not_teleport_known_peer() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));

    let mut players = HashMap::new();
    players.insert("bob".to_string(), snapshot(100.0, 100.0));
    store.apply_world_snapshot(&players);

    // Known peer keeps its displayed position and eases to the new target.
    let bob = store.get("bob").unwrap();
    assert_eq!(bob.current, Vec2::new(0.0, 0.0));
    assert_eq!(bob.target, Vec2::new(100.0, 100.0));
}

#[test]
fn test_remove_drops_entity() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));

    assert!(store.remove("bob"));
    assert!(store.get("bob").is_none());
    assert!(store.is_empty());
}

#[test]
fn test_remove_unknown_peer_returns_false() {
    let mut store = RemoteEntityStore::new();
    assert!(!store.remove("nobody"));
}

#[test]
fn test_reappearing_peer_is_created_fresh() {
    let mut store = RemoteEntityStore::new();
    store.apply_update("bob", &snapshot(0.0, 0.0));
    store.remove("bob");

    store.apply_update("bob", &snapshot(300.0, 300.0));

    let bob = store.get("bob").unwrap();
    assert_eq!(bob.current, Vec2::new(300.0, 300.0), "no ghost easing");
}
