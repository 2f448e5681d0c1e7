//! The per-room game session.

use std::collections::{HashMap, HashSet};

use molehunt_protocol::{Candidate, PlayerId, RoomId};

use crate::mode::ModeName;
use crate::phase::Phase;

/// One roster entry. The roster `Vec` preserves join order; host
/// handover picks the earliest remaining joiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub display_name: String,
}

/// One closed ballot, kept for vote-accuracy stats at finalize.
#[derive(Debug, Clone)]
pub(crate) struct BallotRecord {
    pub voter: PlayerId,
    pub voter_name: String,
    /// Judged against the impostor set at the moment the round closed.
    pub caught: bool,
}

/// The mutable state of one room's game.
///
/// Owned exclusively by the session store; every read-for-decision and
/// dependent write happens inside a single locked `mutate` call. Fields
/// that only exist in later phases (`mode`, `secret`) are `Option` and
/// phase-guarded: the engine never reads them before the transition that
/// sets them.
#[derive(Debug)]
pub struct Session {
    pub room_id: RoomId,
    pub phase: Phase,
    /// Chosen at `ModeSelect → Waiting`; immutable afterwards.
    pub mode: Option<ModeName>,
    /// Join order preserved. Mutable only in `Waiting`, except that
    /// elimination in team/chaos modes removes entries during `Voting`.
    pub roster: Vec<PlayerEntry>,
    pub host: PlayerId,
    /// The canonical secret; assigned at `Waiting → Discussion`.
    pub secret: Option<String>,
    /// Current (not yet eliminated) impostors.
    pub impostors: HashSet<PlayerId>,
    /// Decoy → the wrong secret they were dealt. Disjoint from
    /// `impostors`.
    pub decoys: HashMap<PlayerId, String>,
    /// The open round's ballots, voter → target. Cleared when a round
    /// opens; at most one entry per voter.
    pub votes: HashMap<PlayerId, PlayerId>,
    /// Closed-round ballots accumulated across the whole game.
    pub(crate) ballot_history: Vec<BallotRecord>,
}

impl Session {
    /// A fresh session in `ModeSelect`, hosted by `host`.
    pub fn new(room_id: RoomId, host: PlayerId) -> Self {
        Self {
            room_id,
            phase: Phase::ModeSelect,
            mode: None,
            roster: Vec::new(),
            host,
            secret: None,
            impostors: HashSet::new(),
            decoys: HashMap::new(),
            votes: HashMap::new(),
            ballot_history: Vec::new(),
        }
    }

    /// Whether `player` is in the roster.
    pub fn is_member(&self, player: PlayerId) -> bool {
        self.roster.iter().any(|p| p.id == player)
    }

    /// Display name for a roster member.
    pub fn display_name(&self, player: PlayerId) -> Option<&str> {
        self.roster
            .iter()
            .find(|p| p.id == player)
            .map(|p| p.display_name.as_str())
    }

    /// Removes a player from the roster. Returns the removed entry.
    pub fn remove_player(&mut self, player: PlayerId) -> Option<PlayerEntry> {
        let idx = self.roster.iter().position(|p| p.id == player)?;
        Some(self.roster.remove(idx))
    }

    /// Player ids in join order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.roster.iter().map(|p| p.id).collect()
    }

    /// The roster as ballot candidates.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.roster
            .iter()
            .map(|p| Candidate {
                player: p.id,
                display_name: p.display_name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn session_with_roster(ids: &[u64]) -> Session {
        let mut s = Session::new(RoomId(1), pid(ids[0]));
        for id in ids {
            s.roster.push(PlayerEntry {
                id: pid(*id),
                display_name: format!("player-{id}"),
            });
        }
        s
    }

    #[test]
    fn test_new_session_starts_in_mode_select() {
        let s = Session::new(RoomId(1), pid(1));
        assert_eq!(s.phase, Phase::ModeSelect);
        assert!(s.mode.is_none());
        assert!(s.secret.is_none());
        assert!(s.roster.is_empty());
    }

    #[test]
    fn test_roster_preserves_join_order() {
        let s = session_with_roster(&[3, 1, 2]);
        assert_eq!(s.player_ids(), vec![pid(3), pid(1), pid(2)]);
    }

    #[test]
    fn test_remove_player_keeps_order_of_rest() {
        let mut s = session_with_roster(&[3, 1, 2]);
        let removed = s.remove_player(pid(1)).unwrap();
        assert_eq!(removed.id, pid(1));
        assert_eq!(s.player_ids(), vec![pid(3), pid(2)]);
        assert!(s.remove_player(pid(9)).is_none());
    }

    #[test]
    fn test_membership_and_names() {
        let s = session_with_roster(&[1, 2]);
        assert!(s.is_member(pid(2)));
        assert!(!s.is_member(pid(9)));
        assert_eq!(s.display_name(pid(2)), Some("player-2"));
        assert_eq!(s.display_name(pid(9)), None);
    }
}
