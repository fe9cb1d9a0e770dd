//! Integration tests for the timed battle driver.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) to control time
//! deterministically: sleeps resolve instantly when the runtime advances
//! the clock, so the tests assert exact phase spacing without waiting.

use std::time::Duration;

use nookline_battle::{
    BattleEngine, BattleEvent, BattleOutcome, BattlePhase, BattleTiming, Combatant, Side,
};
use nookline_protocol::Stats;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn combatant(name: &str, hp: i32, attack: i32, defense: i32, speed: i32) -> Combatant {
    Combatant::new(
        name,
        Stats {
            hp,
            attack,
            defense,
            speed,
            critical_chance: 0.0,
        },
    )
}

/// A always first (Speed 10 vs 5); mutual damage exactly 10 per hit.
fn reference_pair() -> (Combatant, Combatant) {
    (
        combatant("A", 50, 20, 5, 10),
        combatant("B", 50, 15, 10, 5),
    )
}

async fn collect_until_ended(
    rx: &mut nookline_battle::BattleEvents,
) -> Vec<(BattlePhase, Duration)> {
    let start = Instant::now();
    let mut events = Vec::new();
    while let Some(BattleEvent { phase, .. }) = rx.recv().await {
        events.push((phase, start.elapsed()));
        if phase.is_terminal() {
            break;
        }
    }
    events
}

// =========================================================================
// Full battles
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_battle_runs_to_completion() {
    let (a, b) = reference_pair();
    let (engine, mut rx) =
        BattleEngine::spawn_with_rng(a, b, BattleTiming::instant(), StdRng::seed_from_u64(0));

    let events = collect_until_ended(&mut rx).await;

    let (last_phase, _) = events.last().expect("battle must emit events");
    assert_eq!(
        *last_phase,
        BattlePhase::Ended(BattleOutcome::Winner(Side::P1))
    );
    assert!(engine.is_finished());

    // Round 5 ends at A's impact: 4 full rounds of 7 transitions, then
    // RoundStart, Attacking, Impact, Recovering, Ended.
    assert_eq!(events.len(), 4 * 7 + 5);
}

#[tokio::test(start_paused = true)]
async fn test_final_snapshot_carries_outcome_and_log() {
    let (a, b) = reference_pair();
    let (engine, mut rx) =
        BattleEngine::spawn_with_rng(a, b, BattleTiming::instant(), StdRng::seed_from_u64(0));

    collect_until_ended(&mut rx).await;

    let snapshot = engine.snapshot();
    assert!(snapshot.phase.is_terminal());
    assert_eq!(snapshot.health2, 0);
    assert_eq!(snapshot.health1, 10);
    assert_eq!(snapshot.log.first().unwrap(), "A starts the battle!");
    assert_eq!(snapshot.log.last().unwrap(), "A Wins!");
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_replays_identical_battle() {
    let timing = BattleTiming::instant();

    let (a, b) = reference_pair();
    let (engine1, mut rx1) =
        BattleEngine::spawn_with_rng(a, b, timing.clone(), StdRng::seed_from_u64(42));
    collect_until_ended(&mut rx1).await;

    let (a, b) = reference_pair();
    let (engine2, mut rx2) =
        BattleEngine::spawn_with_rng(a, b, timing, StdRng::seed_from_u64(42));
    collect_until_ended(&mut rx2).await;

    assert_eq!(engine1.snapshot().log, engine2.snapshot().log);
}

// =========================================================================
// Timing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_phase_spacing_matches_timing() {
    let (a, b) = reference_pair();
    let (_engine, mut rx) = BattleEngine::spawn_with_rng(
        a,
        b,
        BattleTiming::default(),
        StdRng::seed_from_u64(0),
    );

    let start = Instant::now();
    let mut timeline = Vec::new();
    for _ in 0..8 {
        let event = rx.recv().await.expect("driver should keep emitting");
        timeline.push((event.phase, start.elapsed()));
    }

    // First round: bookkeeping phases are instantaneous, the wind-up holds
    // 1 s, and attacks start exactly 2 s apart.
    assert_eq!(timeline[0], (BattlePhase::RoundStart, Duration::ZERO));
    assert_eq!(
        timeline[1],
        (BattlePhase::Attacking(Side::P1), Duration::ZERO)
    );
    assert_eq!(
        timeline[2],
        (BattlePhase::Impact(Side::P1), Duration::from_millis(1000))
    );
    assert_eq!(
        timeline[3],
        (
            BattlePhase::Recovering(Side::P1),
            Duration::from_millis(1000)
        )
    );
    assert_eq!(
        timeline[4],
        (
            BattlePhase::Attacking(Side::P2),
            Duration::from_millis(2000)
        )
    );
    assert_eq!(
        timeline[5],
        (BattlePhase::Impact(Side::P2), Duration::from_millis(3000))
    );
    assert_eq!(
        timeline[6],
        (
            BattlePhase::Recovering(Side::P2),
            Duration::from_millis(3000)
        )
    );
    assert_eq!(
        timeline[7],
        (BattlePhase::RoundStart, Duration::from_millis(4000))
    );
}

#[tokio::test(start_paused = true)]
async fn test_damage_is_applied_at_impact_not_before() {
    let (a, b) = reference_pair();
    let (_engine, mut rx) = BattleEngine::spawn_with_rng(
        a,
        b,
        BattleTiming::default(),
        StdRng::seed_from_u64(0),
    );

    // RoundStart, then Attacking: wind-up announced, no damage yet.
    rx.recv().await.unwrap();
    let attacking = rx.recv().await.unwrap();
    assert_eq!(attacking.phase, BattlePhase::Attacking(Side::P1));
    assert_eq!(attacking.snapshot.health2, 50);

    let impact = rx.recv().await.unwrap();
    assert_eq!(impact.phase, BattlePhase::Impact(Side::P1));
    assert_eq!(impact.snapshot.health2, 40);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_timers() {
    let (a, b) = reference_pair();
    let (engine, mut rx) = BattleEngine::spawn_with_rng(
        a,
        b,
        BattleTiming::default(),
        StdRng::seed_from_u64(0),
    );

    // Let the battle get into the first wind-up, then tear down.
    rx.recv().await.unwrap(); // RoundStart
    rx.recv().await.unwrap(); // Attacking(P1)
    drop(engine);

    // The aborted driver must never emit another event.
    assert!(rx.recv().await.is_none(), "no events after teardown");
}

#[tokio::test(start_paused = true)]
async fn test_abort_is_idempotent() {
    let (a, b) = reference_pair();
    let (mut engine, mut rx) = BattleEngine::spawn_with_rng(
        a,
        b,
        BattleTiming::default(),
        StdRng::seed_from_u64(0),
    );

    rx.recv().await.unwrap();
    engine.abort();
    engine.abort();

    assert!(!engine.is_finished(), "aborted mid-battle, not finished");
}

#[tokio::test(start_paused = true)]
async fn test_driver_stops_when_observer_leaves() {
    let (a, b) = reference_pair();
    let (engine, rx) = BattleEngine::spawn_with_rng(
        a,
        b,
        BattleTiming::instant(),
        StdRng::seed_from_u64(0),
    );

    drop(rx);

    // Give the driver a chance to notice the closed channel.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(
        !engine.is_finished(),
        "driver must stop early, not race to the end unobserved"
    );
}
