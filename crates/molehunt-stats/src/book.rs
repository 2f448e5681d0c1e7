//! The process-wide stats book: records outcomes, unlocks achievements.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use molehunt_protocol::{PlayerId, Side};
use tracing::info;

use crate::achievements::newly_unlocked;
use crate::PlayerStats;

// ---------------------------------------------------------------------------
// Outcome input
// ---------------------------------------------------------------------------

/// How one player finished the game.
#[derive(Debug, Clone)]
pub struct PlayerOutcome {
    pub player: PlayerId,
    pub display_name: String,
    /// Role at game end; decoys are crew.
    pub impostor: bool,
}

/// One ballot cast during the game, with its accuracy already judged
/// against the impostor set at the time the round closed.
#[derive(Debug, Clone)]
pub struct Ballot {
    pub voter: PlayerId,
    pub voter_name: String,
    /// True when the ballot targeted an impostor.
    pub caught: bool,
}

/// Everything the book needs to settle one finished game.
///
/// `players` holds the (possibly reduced) roster at game end; voters
/// eliminated mid-game still get their ballot accuracy credited through
/// `ballots`.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub winner: Side,
    pub players: Vec<PlayerOutcome>,
    pub ballots: Vec<Ballot>,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// One row of a leaderboard section.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub player: PlayerId,
    pub display_name: String,
    pub wins: u32,
    pub win_rate: f64,
    pub games_played: u32,
}

/// The three leaderboard sections, each at most five rows.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    /// Impostors ranked by wins, then win rate.
    pub top_impostors: Vec<LeaderboardRow>,
    /// Crew ranked by win rate, then wins; requires ≥ 10 crew games so
    /// a single lucky game doesn't top the board.
    pub top_crew: Vec<LeaderboardRow>,
    /// Everyone, ranked by games played.
    pub most_active: Vec<LeaderboardRow>,
}

const LEADERBOARD_ROWS: usize = 5;
const CREW_BOARD_MIN_GAMES: u32 = 10;

// ---------------------------------------------------------------------------
// StatsBook
// ---------------------------------------------------------------------------

/// Thread-safe registry of every player's cumulative stats.
///
/// Guarded by its own `RwLock`, independent of any session lock; the
/// engine settles outcomes here only after releasing the room lock.
#[derive(Default)]
pub struct StatsBook {
    players: RwLock<HashMap<PlayerId, PlayerStats>>,
}

impl StatsBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles one finished game: bumps counters for every finisher,
    /// credits ballot accuracy, and evaluates achievement predicates.
    ///
    /// Returns the newly unlocked achievement ids per player (players
    /// with none are omitted). Callers must invoke this at most once per
    /// game; the engine's single `Ended`-transition path guarantees it.
    pub fn finalize(&self, outcome: &GameOutcome) -> Vec<(PlayerId, Vec<String>)> {
        let mut players = self.players.write().expect("stats book poisoned");
        let mut touched: BTreeSet<PlayerId> = BTreeSet::new();

        for finisher in &outcome.players {
            let stats = players
                .entry(finisher.player)
                .or_insert_with(|| PlayerStats::new(finisher.display_name.clone()));
            // Names drift; the latest game wins.
            stats.display_name = finisher.display_name.clone();
            stats.games_played += 1;

            let won = match (finisher.impostor, outcome.winner) {
                (true, Side::Impostors) | (false, Side::Crew) => true,
                _ => false,
            };
            if finisher.impostor {
                stats.impostor_games += 1;
                if won {
                    stats.impostor_wins += 1;
                }
            } else {
                stats.crew_games += 1;
                if won {
                    stats.crew_wins += 1;
                }
            }
            touched.insert(finisher.player);
        }

        for ballot in &outcome.ballots {
            let stats = players
                .entry(ballot.voter)
                .or_insert_with(|| PlayerStats::new(ballot.voter_name.clone()));
            stats.votes_cast += 1;
            if ballot.caught {
                stats.impostors_caught += 1;
            }
            touched.insert(ballot.voter);
        }

        let mut unlocks = Vec::new();
        for player in touched {
            let stats = players.get_mut(&player).expect("just touched");
            let fresh = newly_unlocked(stats);
            if !fresh.is_empty() {
                stats.achievements.extend(fresh.iter().cloned());
                info!(%player, achievements = ?fresh, "achievements unlocked");
                unlocks.push((player, fresh));
            }
        }
        unlocks
    }

    /// A snapshot of one player's record, if they have finished a game.
    pub fn snapshot(&self, player: PlayerId) -> Option<PlayerStats> {
        self.players
            .read()
            .expect("stats book poisoned")
            .get(&player)
            .cloned()
    }

    /// Number of players with a record.
    pub fn len(&self) -> usize {
        self.players.read().expect("stats book poisoned").len()
    }

    /// Whether no player has finished a game yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones the full table for the storage collaborator.
    pub fn export(&self) -> Vec<(PlayerId, PlayerStats)> {
        let players = self.players.read().expect("stats book poisoned");
        let mut rows: Vec<_> = players.iter().map(|(id, s)| (*id, s.clone())).collect();
        rows.sort_by_key(|(id, _)| *id);
        rows
    }

    /// Builds the three leaderboard sections from current records.
    pub fn leaderboard(&self) -> Leaderboard {
        let players = self.players.read().expect("stats book poisoned");

        let mut impostors: Vec<LeaderboardRow> = players
            .iter()
            .map(|(id, s)| LeaderboardRow {
                player: *id,
                display_name: s.display_name.clone(),
                wins: s.impostor_wins,
                win_rate: s.impostor_win_rate(),
                games_played: s.games_played,
            })
            .collect();
        impostors.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then(b.win_rate.total_cmp(&a.win_rate))
        });
        impostors.truncate(LEADERBOARD_ROWS);

        let mut crew: Vec<LeaderboardRow> = players
            .iter()
            .filter(|(_, s)| s.crew_games >= CREW_BOARD_MIN_GAMES)
            .map(|(id, s)| LeaderboardRow {
                player: *id,
                display_name: s.display_name.clone(),
                wins: s.crew_wins,
                win_rate: s.crew_win_rate(),
                games_played: s.games_played,
            })
            .collect();
        crew.sort_by(|a, b| {
            b.win_rate
                .total_cmp(&a.win_rate)
                .then(b.wins.cmp(&a.wins))
        });
        crew.truncate(LEADERBOARD_ROWS);

        let mut active: Vec<LeaderboardRow> = players
            .iter()
            .map(|(id, s)| LeaderboardRow {
                player: *id,
                display_name: s.display_name.clone(),
                wins: s.impostor_wins + s.crew_wins,
                win_rate: 0.0,
                games_played: s.games_played,
            })
            .collect();
        active.sort_by(|a, b| b.games_played.cmp(&a.games_played));
        active.truncate(LEADERBOARD_ROWS);

        Leaderboard {
            top_impostors: impostors,
            top_crew: crew,
            most_active: active,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn crew_win_outcome() -> GameOutcome {
        GameOutcome {
            winner: Side::Crew,
            players: vec![
                PlayerOutcome { player: pid(1), display_name: "Ada".into(), impostor: false },
                PlayerOutcome { player: pid(2), display_name: "Ben".into(), impostor: false },
                PlayerOutcome { player: pid(3), display_name: "Cleo".into(), impostor: true },
            ],
            ballots: vec![
                Ballot { voter: pid(1), voter_name: "Ada".into(), caught: true },
                Ballot { voter: pid(2), voter_name: "Ben".into(), caught: false },
            ],
        }
    }

    #[test]
    fn test_finalize_splits_wins_by_role() {
        let book = StatsBook::new();
        book.finalize(&crew_win_outcome());

        let ada = book.snapshot(pid(1)).unwrap();
        assert_eq!(ada.games_played, 1);
        assert_eq!(ada.crew_games, 1);
        assert_eq!(ada.crew_wins, 1);
        assert_eq!(ada.impostor_games, 0);

        let cleo = book.snapshot(pid(3)).unwrap();
        assert_eq!(cleo.impostor_games, 1);
        assert_eq!(cleo.impostor_wins, 0, "impostor lost a crew win");
    }

    #[test]
    fn test_finalize_credits_ballot_accuracy() {
        let book = StatsBook::new();
        book.finalize(&crew_win_outcome());

        let ada = book.snapshot(pid(1)).unwrap();
        assert_eq!(ada.votes_cast, 1);
        assert_eq!(ada.impostors_caught, 1);

        let ben = book.snapshot(pid(2)).unwrap();
        assert_eq!(ben.votes_cast, 1);
        assert_eq!(ben.impostors_caught, 0);
    }

    #[test]
    fn test_finalize_reports_new_achievements() {
        let book = StatsBook::new();
        let unlocks = book.finalize(&crew_win_outcome());

        // Everyone finished their first game, so all three unlock "rookie".
        assert_eq!(unlocks.len(), 3);
        for (_, ids) in &unlocks {
            assert!(ids.contains(&"rookie".to_string()));
        }

        // A second game unlocks nothing new.
        let unlocks = book.finalize(&crew_win_outcome());
        assert!(unlocks.is_empty());
    }

    #[test]
    fn test_eliminated_voter_still_gets_ballot_credit() {
        // A voter who was voted out mid-game is absent from `players`
        // but present in `ballots`; their accuracy still counts.
        let book = StatsBook::new();
        let outcome = GameOutcome {
            winner: Side::Crew,
            players: vec![PlayerOutcome {
                player: pid(1),
                display_name: "Ada".into(),
                impostor: false,
            }],
            ballots: vec![Ballot { voter: pid(9), voter_name: "Zed".into(), caught: true }],
        };
        book.finalize(&outcome);

        let zed = book.snapshot(pid(9)).unwrap();
        assert_eq!(zed.votes_cast, 1);
        assert_eq!(zed.impostors_caught, 1);
        assert_eq!(zed.games_played, 0, "not in the final roster");
    }

    #[test]
    fn test_display_name_updates_on_later_games() {
        let book = StatsBook::new();
        book.finalize(&crew_win_outcome());

        let mut renamed = crew_win_outcome();
        renamed.players[0].display_name = "Ada L.".into();
        book.finalize(&renamed);

        assert_eq!(book.snapshot(pid(1)).unwrap().display_name, "Ada L.");
    }

    #[test]
    fn test_snapshot_unknown_player_is_none() {
        let book = StatsBook::new();
        assert!(book.snapshot(pid(42)).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_leaderboard_ranks_and_truncates() {
        let book = StatsBook::new();
        // Seven players with increasing impostor win counts.
        for i in 1..=7u64 {
            for _ in 0..i {
                book.finalize(&GameOutcome {
                    winner: Side::Impostors,
                    players: vec![PlayerOutcome {
                        player: pid(i),
                        display_name: format!("player-{i}"),
                        impostor: true,
                    }],
                    ballots: vec![],
                });
            }
        }

        let board = book.leaderboard();
        assert_eq!(board.top_impostors.len(), 5);
        assert_eq!(board.top_impostors[0].player, pid(7));
        assert_eq!(board.top_impostors[0].wins, 7);
        assert_eq!(board.most_active[0].player, pid(7));
    }

    #[test]
    fn test_leaderboard_crew_section_has_games_floor() {
        let book = StatsBook::new();
        // One crew win: 100% rate but below the 10-game floor.
        book.finalize(&GameOutcome {
            winner: Side::Crew,
            players: vec![PlayerOutcome {
                player: pid(1),
                display_name: "Ada".into(),
                impostor: false,
            }],
            ballots: vec![],
        });

        assert!(book.leaderboard().top_crew.is_empty());
    }

    #[test]
    fn test_export_is_sorted_by_player_id() {
        let book = StatsBook::new();
        book.finalize(&crew_win_outcome());

        let rows = book.export();
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
