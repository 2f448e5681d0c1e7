//! Cumulative player statistics and achievements for Molehunt.
//!
//! The engine calls [`StatsBook::finalize`] exactly once per finished
//! game, after the session lock is released. Everything here is
//! process-wide and independent of any single room.
//!
//! Records are handed to an external storage collaborator for
//! persistence; [`PlayerStats`] derives serde and its JSON field names
//! are pinned by tests so the schema stays stable across restarts.

mod achievements;
mod book;
mod record;

pub use achievements::{ACHIEVEMENTS, AchievementDef};
pub use book::{Ballot, GameOutcome, Leaderboard, LeaderboardRow, PlayerOutcome, StatsBook};
pub use record::PlayerStats;
