//! Vote recording, tallying, and elimination resolution.
//!
//! Recording mutates the session and therefore runs inside the store's
//! room lock. The tally itself is a pure count, so order of arrival never
//! affects the result. Elimination resolution is a strategy per
//! [`EliminationVariant`], so mode-specific branching lives here instead
//! of being scattered through the engine.

use std::collections::HashMap;

use molehunt_protocol::{PlayerId, Side};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::{EngineError, VoteRejection};
use crate::mode::EliminationVariant;
use crate::phase::Phase;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Records one vote. All preconditions are checked against the locked
/// session; a rejected vote leaves `votes` untouched.
///
/// Returns `true` when this ballot completed the round (every roster
/// member has voted). The caller that observes `true` is the single
/// caller responsible for closing the round.
pub(crate) fn record_vote(
    session: &mut Session,
    voter: PlayerId,
    target: PlayerId,
) -> Result<bool, EngineError> {
    if session.phase != Phase::Voting {
        return Err(EngineError::InvalidPhase {
            room_id: session.room_id,
            phase: session.phase,
        });
    }
    let reject = |reason| EngineError::InvalidVote {
        room_id: session.room_id,
        reason,
    };
    if !session.is_member(voter) {
        return Err(reject(VoteRejection::UnknownVoter));
    }
    if !session.is_member(target) {
        return Err(reject(VoteRejection::UnknownTarget));
    }
    if session.votes.contains_key(&voter) {
        return Err(reject(VoteRejection::AlreadyVoted));
    }

    session.votes.insert(voter, target);
    Ok(session.votes.len() == session.roster.len())
}

// ---------------------------------------------------------------------------
// Tally and tie-break
// ---------------------------------------------------------------------------

/// Counts votes per target. Pure; order-independent.
pub fn tally(votes: &HashMap<PlayerId, PlayerId>) -> HashMap<PlayerId, usize> {
    let mut counts = HashMap::new();
    for target in votes.values() {
        *counts.entry(*target).or_insert(0) += 1;
    }
    counts
}

/// Who a closed round eliminated, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EliminationPick {
    pub player: PlayerId,
    pub votes: usize,
    /// True when the maximum was shared and this player was drawn
    /// uniformly from the tied set.
    pub tie_break: bool,
}

/// Resolves a tally to the eliminated player: strict maximum, or a
/// uniform random draw among the tied leaders. `None` when no votes
/// were cast at all.
///
/// The tied set is sorted before drawing so the draw depends only on
/// the `Rng`, not on hash-map iteration order.
pub fn pick_eliminated(
    counts: &HashMap<PlayerId, usize>,
    rng: &mut impl Rng,
) -> Option<EliminationPick> {
    let max = *counts.values().max()?;
    let mut tied: Vec<PlayerId> = counts
        .iter()
        .filter(|(_, n)| **n == max)
        .map(|(p, _)| *p)
        .collect();
    tied.sort();

    let tie_break = tied.len() > 1;
    let player = *tied.choose(rng).expect("tied set is non-empty");
    Some(EliminationPick { player, votes: max, tie_break })
}

// ---------------------------------------------------------------------------
// Elimination policies
// ---------------------------------------------------------------------------

/// What happens after a round's elimination is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundOutcome {
    /// The game is over.
    Ended { winner: Side },
    /// An impostor fell but teammates remain; open a fresh ballot.
    Revote { impostors_remaining: usize },
    /// The lone impostor survived the vote and may guess the secret.
    AwaitGuess { impostor: PlayerId },
}

/// Per-variant elimination resolution. Implementations may reduce the
/// roster (team/chaos remove a caught impostor before the re-vote).
pub(crate) trait EliminationPolicy: Send + Sync {
    fn resolve(&self, session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome;
}

/// Zero votes cast: nobody is eliminated and the impostors win by
/// default. Shared by every variant.
fn default_win() -> RoundOutcome {
    RoundOutcome::Ended { winner: Side::Impostors }
}

struct SingleImpostor;

impl EliminationPolicy for SingleImpostor {
    fn resolve(&self, session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome {
        let Some(eliminated) = eliminated else {
            return default_win();
        };
        if session.impostors.contains(&eliminated) {
            return RoundOutcome::Ended { winner: Side::Crew };
        }
        // Crew voted out one of their own; the impostor survives and
        // gets a shot at the secret.
        let impostor = *session
            .impostors
            .iter()
            .next()
            .expect("single-impostor game always has its impostor");
        RoundOutcome::AwaitGuess { impostor }
    }
}

/// Team and chaos modes share the iterative resolution: catching an
/// impostor shrinks the game and re-opens voting until the last one is
/// out or the crew misfires.
fn eliminate_and_continue(session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome {
    let Some(eliminated) = eliminated else {
        return default_win();
    };
    if !session.impostors.contains(&eliminated) {
        return RoundOutcome::Ended { winner: Side::Impostors };
    }
    session.impostors.remove(&eliminated);
    session.remove_player(eliminated);
    if session.impostors.is_empty() {
        RoundOutcome::Ended { winner: Side::Crew }
    } else {
        RoundOutcome::Revote {
            impostors_remaining: session.impostors.len(),
        }
    }
}

struct TeamImpostors;

impl EliminationPolicy for TeamImpostors {
    fn resolve(&self, session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome {
        eliminate_and_continue(session, eliminated)
    }
}

struct ChaosMulti;

impl EliminationPolicy for ChaosMulti {
    fn resolve(&self, session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome {
        eliminate_and_continue(session, eliminated)
    }
}

struct ImpostorPlusDecoy;

impl EliminationPolicy for ImpostorPlusDecoy {
    fn resolve(&self, session: &mut Session, eliminated: Option<PlayerId>) -> RoundOutcome {
        let Some(eliminated) = eliminated else {
            return default_win();
        };
        if session.impostors.contains(&eliminated) {
            RoundOutcome::Ended { winner: Side::Crew }
        } else {
            // A decoy or genuine crew member went down; either way the
            // real impostor walks. No guess window in this variant.
            RoundOutcome::Ended { winner: Side::Impostors }
        }
    }
}

/// The strategy for a variant.
pub(crate) fn policy_for(variant: EliminationVariant) -> &'static dyn EliminationPolicy {
    match variant {
        EliminationVariant::SingleImpostor => &SingleImpostor,
        EliminationVariant::TeamImpostors => &TeamImpostors,
        EliminationVariant::ImpostorPlusDecoy => &ImpostorPlusDecoy,
        EliminationVariant::ChaosMulti => &ChaosMulti,
    }
}

// =========================================================================
// Tests
// =========================================================================
