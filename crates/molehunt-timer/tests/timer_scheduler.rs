//! Integration tests for the generation-checked timer scheduler.
//!
//! Uses `tokio::test(start_paused = true)` so sleeps resolve as soon as
//! the runtime is idle, so tests stay fast and deterministic.

use std::time::Duration;

use molehunt_protocol::RoomId;
use molehunt_timer::{Expiry, TimerPurpose, TimerScheduler};

fn room(id: u64) -> RoomId {
    RoomId(id)
}

async fn recv_with_timeout(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<Expiry>,
) -> Option<Expiry> {
    tokio::time::timeout(Duration::from_secs(3600), rx.recv())
        .await
        .ok()
        .flatten()
}

// =========================================================================
// Arm and fire
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_armed_timer_fires_with_its_generation() {
    let (scheduler, mut rx) = TimerScheduler::new();

    let generation = scheduler.arm(room(1), TimerPurpose::Discussion, Duration::from_secs(300));

    let expiry = recv_with_timeout(&mut rx).await.expect("timer should fire");
    assert_eq!(expiry.room_id, room(1));
    assert_eq!(expiry.purpose, TimerPurpose::Discussion);
    assert_eq!(expiry.generation, generation);
    assert!(scheduler.is_current(room(1), expiry.generation));
}

#[tokio::test(start_paused = true)]
async fn test_rooms_have_independent_generations() {
    let (scheduler, _rx) = TimerScheduler::new();

    let g1 = scheduler.arm(room(1), TimerPurpose::Discussion, Duration::from_secs(60));
    let g2 = scheduler.arm(room(2), TimerPurpose::Discussion, Duration::from_secs(60));

    // Both rooms start from generation 1; counters are per-room.
    assert_eq!(g1, 1);
    assert_eq!(g2, 1);
    assert!(scheduler.is_current(room(1), g1));
    assert!(scheduler.is_current(room(2), g2));
}

// =========================================================================
// Superseding and staleness
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rearming_same_purpose_supersedes_old_timer() {
    let (scheduler, mut rx) = TimerScheduler::new();

    let old = scheduler.arm(room(1), TimerPurpose::Voting, Duration::from_secs(60));
    let new = scheduler.arm(room(1), TimerPurpose::Voting, Duration::from_secs(30));
    assert!(new > old);
    assert!(!scheduler.is_current(room(1), old));

    // Only the replacement fires; the superseded task was aborted.
    let expiry = recv_with_timeout(&mut rx).await.expect("new timer should fire");
    assert_eq!(expiry.generation, new);
    assert!(rx.try_recv().is_err(), "old timer must not fire");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_makes_delivered_expiry_stale() {
    let (scheduler, mut rx) = TimerScheduler::new();

    let generation = scheduler.arm(room(1), TimerPurpose::Guess, Duration::from_secs(30));

    // Let it fire, then cancel before the consumer drains the channel,
    // the race where "the session advanced" loses to delivery.
    let expiry = recv_with_timeout(&mut rx).await.expect("timer should fire");
    assert_eq!(expiry.generation, generation);

    scheduler.cancel(room(1), TimerPurpose::Guess);
    assert!(
        !scheduler.is_current(room(1), expiry.generation),
        "expiry must be stale after cancel"
    );
}

#[tokio::test(start_paused = true)]
async fn test_arming_any_timer_stales_other_purposes() {
    // Per-room generation: a phase transition arming the next timer
    // invalidates the previous phase's timer even if abort raced.
    let (scheduler, _rx) = TimerScheduler::new();

    let discussion = scheduler.arm(room(1), TimerPurpose::Discussion, Duration::from_secs(300));
    let voting = scheduler.arm(room(1), TimerPurpose::Voting, Duration::from_secs(60));

    assert!(!scheduler.is_current(room(1), discussion));
    assert!(scheduler.is_current(room(1), voting));
}

// =========================================================================
// Cancellation idempotency
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_never_armed_purpose_is_noop() {
    let (scheduler, _rx) = TimerScheduler::new();

    // Unknown room, unknown purpose. Must not panic.
    scheduler.cancel(room(9), TimerPurpose::Voting);
    scheduler.cancel_all(room(9));
    assert_eq!(scheduler.current_generation(room(9)), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_fire_is_noop() {
    let (scheduler, mut rx) = TimerScheduler::new();

    scheduler.arm(room(1), TimerPurpose::Voting, Duration::from_secs(1));
    recv_with_timeout(&mut rx).await.expect("timer should fire");

    // Already fired; cancelling again is safe, twice over.
    scheduler.cancel(room(1), TimerPurpose::Voting);
    scheduler.cancel(room(1), TimerPurpose::Voting);
}

// =========================================================================
// Room teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_all_stops_every_pending_timer() {
    let (scheduler, mut rx) = TimerScheduler::new();

    scheduler.arm(room(1), TimerPurpose::Discussion, Duration::from_secs(300));
    scheduler.arm(room(1), TimerPurpose::Guess, Duration::from_secs(30));
    scheduler.cancel_all(room(1));

    // Nothing should ever arrive; prove it by letting paused time run
    // far past both deadlines via an unrelated room's timer.
    scheduler.arm(room(2), TimerPurpose::Discussion, Duration::from_secs(3000));
    let expiry = recv_with_timeout(&mut rx).await.expect("sentinel fires");
    assert_eq!(expiry.room_id, room(2));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_forget_drops_generation_tracking() {
    let (scheduler, mut rx) = TimerScheduler::new();

    let generation = scheduler.arm(room(1), TimerPurpose::Voting, Duration::from_secs(60));
    recv_with_timeout(&mut rx).await.expect("timer should fire");

    scheduler.forget(room(1));

    assert_eq!(scheduler.current_generation(room(1)), None);
    assert!(
        !scheduler.is_current(room(1), generation),
        "expiries for a forgotten room are always stale"
    );
}
