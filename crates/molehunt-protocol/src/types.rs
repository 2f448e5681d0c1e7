//! Identity types, routing, and the notice vocabulary.
//!
//! Notices are values, not messages on a wire: the engine produces them
//! under its room lock and the caller delivers them after the lock is
//! released. They still derive serde so a transport that wants to ship
//! them over a queue or log them as JSON can do so without adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a player id can never be confused with a room id.
/// `#[serde(transparent)]` keeps the JSON representation a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one chat group = one room = at most one
/// running game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a notice?
// ---------------------------------------------------------------------------

/// Specifies who a [`Notice`] is addressed to.
///
/// Role cards and guess prompts are private (`Player`); almost everything
/// else is a room-wide announcement (`All`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player currently in the room.
    All,

    /// One specific player, delivered privately.
    Player(PlayerId),

    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Sides and role cards
// ---------------------------------------------------------------------------

/// The winning side of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The impostor(s) won: survived the vote, guessed the secret, or
    /// benefited from a default (zero votes cast).
    Impostors,

    /// The crew won: every impostor was voted out, or a surviving
    /// impostor failed the guess.
    Crew,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Impostors => write!(f, "impostors"),
            Self::Crew => write!(f, "crew"),
        }
    }
}

/// The private role information dealt to one player at game start.
///
/// A decoy receives a `Crew` card like everyone else; the secret inside
/// is simply wrong. Only the engine knows who the decoys are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleCard {
    /// You are an impostor. `partners` lists your fellow impostors in
    /// team/chaos modes (empty in single-impostor modes).
    Impostor { partners: Vec<PlayerId> },

    /// You are crew; here is the shared secret.
    Crew { secret: String },
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// One entry on a ballot: a player who can be voted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// The player's id (vote target).
    pub player: PlayerId,
    /// Display name as given at join time.
    pub display_name: String,
}

/// A side-effect description the engine emits for the transport to deliver.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON
/// (`{ "type": "BallotOpened", ... }`) so a transport can dispatch on a
/// single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// A session was created and is waiting for a mode to be chosen.
    SessionCreated {
        host: PlayerId,
        /// Names of the selectable modes, for building a menu.
        modes: Vec<String>,
    },

    /// The host picked a mode; the lobby is open for joins.
    ModeChosen {
        mode: String,
        min_players: usize,
    },

    /// A player joined the lobby. `ready` flips to true once the roster
    /// meets the mode's minimum.
    PlayerJoined {
        player: PlayerId,
        display_name: String,
        player_count: usize,
        ready: bool,
    },

    /// A player left the lobby. If the host left, `new_host` names the
    /// earliest remaining joiner who inherited the room.
    PlayerLeft {
        player: PlayerId,
        new_host: Option<PlayerId>,
    },

    /// Private role information for one player (always `Recipient::Player`).
    RoleCard { card: RoleCard },

    /// The game started; players should discuss for `seconds`.
    DiscussionStarted {
        mode: String,
        seconds: u64,
    },

    /// A voting round opened with these candidates.
    BallotOpened {
        candidates: Vec<Candidate>,
        seconds: u64,
    },

    /// A vote was accepted; progress counter for the room.
    VoteProgress {
        cast: usize,
        needed: usize,
    },

    /// The round's tally eliminated a player.
    Eliminated {
        player: PlayerId,
        votes: usize,
        /// True when the strict maximum was shared and the eliminated
        /// player was drawn at random from the tied set.
        tie_break: bool,
        was_impostor: bool,
    },

    /// An impostor was eliminated but teammates remain; a fresh voting
    /// round follows.
    RevoteStarted {
        impostors_remaining: usize,
    },

    /// The surviving impostor may guess the secret within `seconds`
    /// (always `Recipient::Player`).
    GuessWindowOpened { seconds: u64 },

    /// The game ended. `secret` is the canonical secret, revealed to all.
    GameOver {
        winner: Side,
        impostors: Vec<PlayerId>,
        secret: String,
    },

    /// Cumulative stats crossed one or more achievement thresholds
    /// (always `Recipient::Player`).
    AchievementsUnlocked { ids: Vec<String> },

    /// The session was closed without finishing (host abort or the lobby
    /// emptied out).
    SessionClosed,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON-shape tests: the transport collaborator dispatches on these
    //! exact field names, so the serde attributes are part of the contract.

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(99)).unwrap();
        assert_eq!(json, "99");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_side_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Side::Impostors).unwrap(), "\"impostors\"");
        assert_eq!(serde_json::to_string(&Side::Crew).unwrap(), "\"crew\"");
    }

    #[test]
    fn test_role_card_impostor_json_format() {
        let card = RoleCard::Impostor {
            partners: vec![PlayerId(2), PlayerId(3)],
        };
        let json: serde_json::Value = serde_json::to_value(&card).unwrap();

        assert_eq!(json["role"], "impostor");
        assert_eq!(json["partners"], serde_json::json!([2, 3]));
    }

    #[test]
    fn test_role_card_crew_json_format() {
        let card = RoleCard::Crew {
            secret: "Submarine".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&card).unwrap();

        assert_eq!(json["role"], "crew");
        assert_eq!(json["secret"], "Submarine");
    }

    #[test]
    fn test_notice_is_internally_tagged() {
        let notice = Notice::VoteProgress { cast: 2, needed: 5 };
        let json: serde_json::Value = serde_json::to_value(&notice).unwrap();

        assert_eq!(json["type"], "VoteProgress");
        assert_eq!(json["cast"], 2);
        assert_eq!(json["needed"], 5);
    }

    #[test]
    fn test_notice_ballot_opened_round_trip() {
        let notice = Notice::BallotOpened {
            candidates: vec![
                Candidate { player: PlayerId(1), display_name: "Ada".into() },
                Candidate { player: PlayerId(2), display_name: "Ben".into() },
            ],
            seconds: 60,
        };
        let bytes = serde_json::to_vec(&notice).unwrap();
        let decoded: Notice = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(notice, decoded);
    }

    #[test]
    fn test_notice_game_over_round_trip() {
        let notice = Notice::GameOver {
            winner: Side::Crew,
            impostors: vec![PlayerId(4)],
            secret: "Airport".into(),
        };
        let bytes = serde_json::to_vec(&notice).unwrap();
        let decoded: Notice = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(notice, decoded);
    }

    #[test]
    fn test_recipient_round_trip() {
        for r in [
            Recipient::All,
            Recipient::Player(PlayerId(7)),
            Recipient::AllExcept(PlayerId(3)),
        ] {
            let bytes = serde_json::to_vec(&r).unwrap();
            let decoded: Recipient = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(r, decoded);
        }
    }

    #[test]
    fn test_decode_unknown_notice_type_returns_error() {
        let unknown = r#"{"type": "TeleportPlayer", "to": "moon"}"#;
        let result: Result<Notice, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
