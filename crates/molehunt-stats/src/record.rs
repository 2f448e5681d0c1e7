//! The per-player cumulative record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Lifetime statistics for one player, across every game they finished.
///
/// Created lazily on a player's first finished game and never deleted.
/// This struct is the persistence schema handed to the storage
/// collaborator; field renames are breaking changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Display name as of the player's most recent game.
    pub display_name: String,

    /// Finished games, in any role. Aborted sessions don't count.
    pub games_played: u32,

    /// Games played as an impostor, and how many of those were won.
    pub impostor_games: u32,
    pub impostor_wins: u32,

    /// Games played as crew (decoys count as crew), and wins.
    pub crew_games: u32,
    pub crew_wins: u32,

    /// Total ballots this player cast across all voting rounds.
    pub votes_cast: u32,

    /// Ballots that targeted an impostor.
    pub impostors_caught: u32,

    /// Unlocked achievement ids. `BTreeSet` keeps the serialized order
    /// deterministic.
    pub achievements: BTreeSet<String>,
}

impl PlayerStats {
    /// A fresh record for a player who just finished their first game.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            games_played: 0,
            impostor_games: 0,
            impostor_wins: 0,
            crew_games: 0,
            crew_wins: 0,
            votes_cast: 0,
            impostors_caught: 0,
            achievements: BTreeSet::new(),
        }
    }

    /// Win rate as an impostor, in percent. 0 when no impostor games.
    pub fn impostor_win_rate(&self) -> f64 {
        rate(self.impostor_wins, self.impostor_games)
    }

    /// Win rate as crew, in percent. 0 when no crew games.
    pub fn crew_win_rate(&self) -> f64 {
        rate(self.crew_wins, self.crew_games)
    }
}

fn rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(games) * 100.0
    }
}
