//! Phase-expiry scheduler for Molehunt game sessions.
//!
//! Every game phase with a deadline (discussion, voting, the impostor's
//! guess window) arms exactly one fire-once timer here. The hard problem
//! is not firing timers; it is making sure a timer that fires *late*
//! cannot touch a session that has already moved on, been re-armed, or
//! been destroyed.
//!
//! # Generation counters
//!
//! Each room carries a generation counter. Arming or cancelling any timer
//! for a room bumps the generation, and the [`Expiry`] a timer delivers
//! carries the generation it was armed with. Consumers compare the two
//! under their own session lock (see [`TimerScheduler::is_current`]); a
//! mismatch means the expiry is stale and must be dropped silently. This
//! makes the race between "all votes arrived" and "voting timer fired"
//! safe without cooperative is-alive flags: the winner bumps the
//! generation, the loser's expiry no longer matches.
//!
//! # Integration
//!
//! Expiries are delivered as values on an mpsc channel, not as callbacks,
//! so the consumer decides what lock to hold while reacting:
//!
//! ```ignore
//! let (scheduler, mut expiries) = TimerScheduler::new();
//! scheduler.arm(room, TimerPurpose::Voting, Duration::from_secs(60));
//! while let Some(expiry) = expiries.recv().await {
//!     // lock the session, then:
//!     if !scheduler.is_current(expiry.room_id, expiry.generation) {
//!         continue; // stale: the session advanced through another path
//!     }
//!     // act on the expiry
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use molehunt_protocol::RoomId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Purpose and expiry
// ---------------------------------------------------------------------------

/// The logical purpose a timer was armed for.
///
/// A room never has more than one live timer per purpose: arming a
/// purpose that already has one replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Discussion phase deadline; expiry opens the ballot.
    Discussion,
    /// Voting round deadline; expiry closes the round with whatever
    /// votes arrived.
    Voting,
    /// Guess window deadline; expiry ends the game in the crew's favor.
    Guess,
}

impl fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discussion => write!(f, "discussion"),
            Self::Voting => write!(f, "voting"),
            Self::Guess => write!(f, "guess"),
        }
    }
}

/// A fired timer, delivered on the scheduler's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// The room the timer belonged to.
    pub room_id: RoomId,
    /// What the timer was armed for.
    pub purpose: TimerPurpose,
    /// The room generation at arm time. Stale if it no longer matches
    /// [`TimerScheduler::current_generation`].
    pub generation: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Per-room timer bookkeeping.
struct RoomTimers {
    /// Bumped on every arm and cancel. An expiry is valid only while its
    /// captured generation equals this.
    generation: u64,
    /// Live sleep tasks by purpose. Aborting a finished task is a no-op,
    /// so entries are not pruned eagerly.
    handles: HashMap<TimerPurpose, JoinHandle<()>>,
}

impl RoomTimers {
    fn new() -> Self {
        Self { generation: 0, handles: HashMap::new() }
    }
}

/// Fire-once timer scheduler with per-room generation counters.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. The internal
/// mutex is held only for bookkeeping, never across an await.
pub struct TimerScheduler {
    rooms: Mutex<HashMap<RoomId, RoomTimers>>,
    tx: mpsc::UnboundedSender<Expiry>,
}

impl TimerScheduler {
    /// Creates a scheduler and the channel its expiries are delivered on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rooms: Mutex::new(HashMap::new()),
                tx,
            },
            rx,
        )
    }

    /// Arms a fire-once timer for `room_id`/`purpose`.
    ///
    /// Any live timer for the same purpose is replaced, and the room's
    /// generation is bumped so every previously armed expiry for this
    /// room, delivered or not, becomes stale. Returns the generation
    /// the new timer was armed with.
    pub fn arm(&self, room_id: RoomId, purpose: TimerPurpose, duration: Duration) -> u64 {
        let mut rooms = self.rooms.lock().expect("timer registry poisoned");
        let entry = rooms.entry(room_id).or_insert_with(RoomTimers::new);

        if let Some(old) = entry.handles.remove(&purpose) {
            old.abort();
        }
        entry.generation += 1;
        let generation = entry.generation;

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            trace!(%room_id, %purpose, generation, "timer fired");
            // Receiver gone means the engine is shutting down.
            let _ = tx.send(Expiry { room_id, purpose, generation });
        });
        entry.handles.insert(purpose, handle);

        debug!(%room_id, %purpose, generation, ?duration, "timer armed");
        generation
    }

    /// Cancels the live timer for `purpose`, if any.
    ///
    /// Safe to call when no such timer exists or when it already fired
    /// (idempotent). The generation is bumped either way, so an
    /// already-fired-but-undelivered expiry goes stale too.
    pub fn cancel(&self, room_id: RoomId, purpose: TimerPurpose) {
        let mut rooms = self.rooms.lock().expect("timer registry poisoned");
        let Some(entry) = rooms.get_mut(&room_id) else {
            return;
        };
        if let Some(handle) = entry.handles.remove(&purpose) {
            handle.abort();
        }
        entry.generation += 1;
        debug!(%room_id, %purpose, "timer cancelled");
    }

    /// Cancels every live timer for the room and bumps its generation.
    ///
    /// The room stays registered; use [`forget`](Self::forget) when the
    /// room is being destroyed.
    pub fn cancel_all(&self, room_id: RoomId) {
        let mut rooms = self.rooms.lock().expect("timer registry poisoned");
        let Some(entry) = rooms.get_mut(&room_id) else {
            return;
        };
        for (_, handle) in entry.handles.drain() {
            handle.abort();
        }
        entry.generation += 1;
        debug!(%room_id, "all timers cancelled");
    }

    /// Cancels everything for the room and drops its bookkeeping.
    ///
    /// After this, [`current_generation`](Self::current_generation)
    /// returns `None` for the room and any in-flight expiry fails the
    /// [`is_current`](Self::is_current) check.
    pub fn forget(&self, room_id: RoomId) {
        let mut rooms = self.rooms.lock().expect("timer registry poisoned");
        if let Some(mut entry) = rooms.remove(&room_id) {
            for (_, handle) in entry.handles.drain() {
                handle.abort();
            }
            debug!(%room_id, "timer state dropped");
        }
    }

    /// The room's current generation, or `None` if the room is unknown
    /// (never armed, or forgotten).
    pub fn current_generation(&self, room_id: RoomId) -> Option<u64> {
        let rooms = self.rooms.lock().expect("timer registry poisoned");
        rooms.get(&room_id).map(|e| e.generation)
    }

    /// Whether an expiry's captured generation is still the room's
    /// current one. Call this under the same lock that protects the
    /// state the expiry is about to mutate.
    pub fn is_current(&self, room_id: RoomId, generation: u64) -> bool {
        self.current_generation(room_id) == Some(generation)
    }
}
