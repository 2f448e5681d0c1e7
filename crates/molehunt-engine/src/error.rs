//! Error types for the game engine.
//!
//! Every variant is recoverable: the transport reports it to the user and
//! the session stays consistent. The engine never panics on bad input,
//! and a stale timer firing is not an error at all (it is a silent no-op
//! handled inside the expiry dispatch).

use molehunt_protocol::{PlayerId, RoomId};

use crate::phase::Phase;

/// Why a vote was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    /// The voter already has a ballot in this round.
    AlreadyVoted,
    /// The voter is not in the roster.
    UnknownVoter,
    /// The target is not in the roster.
    UnknownTarget,
}

impl std::fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyVoted => write!(f, "voter already voted this round"),
            Self::UnknownVoter => write!(f, "voter is not in the game"),
            Self::UnknownTarget => write!(f, "target is not in the game"),
        }
    }
}

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No session exists for this room.
    #[error("no active session in room {0}")]
    NotFound(RoomId),

    /// The room already has a session; end it before creating another.
    #[error("room {0} already has an active session")]
    AlreadyActive(RoomId),

    /// The operation is not legal in the session's current phase.
    #[error("not allowed in phase {phase} (room {room_id})")]
    InvalidPhase { room_id: RoomId, phase: Phase },

    /// Join/leave attempted after the lobby closed.
    #[error("game in room {0} has already started")]
    GameStarted(RoomId),

    /// The player is already in the roster.
    #[error("player {0} already joined room {1}")]
    AlreadyJoined(PlayerId, RoomId),

    /// The roster is at the mode's capacity.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is not in the roster.
    #[error("player {0} is not in room {1}")]
    NotJoined(PlayerId, RoomId),

    /// The roster is below the mode's minimum. Checked before role
    /// assignment is ever invoked.
    #[error("mode {mode} needs at least {required} players, have {actual}")]
    InsufficientPlayers {
        mode: String,
        required: usize,
        actual: usize,
    },

    /// A host-only operation was attempted by someone else.
    #[error("player {0} is not allowed to do that")]
    NotAuthorized(PlayerId),

    /// No mode with this name exists.
    #[error("unknown game mode {0:?}")]
    UnknownMode(String),

    /// The ballot rejected this vote; `votes` is unchanged.
    #[error("invalid vote in room {room_id}: {reason}")]
    InvalidVote {
        room_id: RoomId,
        reason: VoteRejection,
    },

    /// A guess was submitted but no guess window is open for this player.
    #[error("room {0} is not awaiting a guess from this player")]
    NotAwaitingGuess(RoomId),
}
