//! The session lifecycle state machine.

use std::fmt;

/// The lifecycle phase of a game session.
///
/// Transitions move strictly forward, with one deliberate exception:
/// `Voting → Voting` re-arms a fresh ballot in team/chaos modes after an
/// impostor is eliminated while teammates remain.
///
/// ```text
/// ModeSelect → Waiting → Discussion → Voting ⟲ → AwaitingGuess → Ended
///                                         │                        ↑
///                                         └────────────────────────┘
/// ```
///
/// - **ModeSelect**: session exists, host is picking a mode.
/// - **Waiting**: lobby is open; roster mutations are legal only here.
/// - **Discussion**: roles dealt, secret assigned, players talk.
/// - **Voting**: a ballot is open; votes accumulate.
/// - **AwaitingGuess**: a lone surviving impostor has a time-boxed
///   chance to guess the secret.
/// - **Ended**: terminal. The session is removed; there is no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ModeSelect,
    Waiting,
    Discussion,
    Voting,
    AwaitingGuess,
    Ended,
}

impl Phase {
    /// Returns `true` if roster mutations (join/leave) are legal.
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the game has been dealt and is in play.
    pub fn is_in_play(&self) -> bool {
        matches!(self, Self::Discussion | Self::Voting | Self::AwaitingGuess)
    }

    /// Returns `true` if transitioning to `target` is legal.
    ///
    /// Every phase mutation in the engine funnels through this check, so
    /// an illegal transition can never partially apply.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::ModeSelect, Self::Waiting)
                | (Self::Waiting, Self::Discussion)
                | (Self::Discussion, Self::Voting)
                | (Self::Voting, Self::Voting)
                | (Self::Voting, Self::AwaitingGuess)
                | (Self::Voting, Self::Ended)
                | (Self::AwaitingGuess, Self::Ended)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeSelect => write!(f, "ModeSelect"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Discussion => write!(f, "Discussion"),
            Self::Voting => write!(f, "Voting"),
            Self::AwaitingGuess => write!(f, "AwaitingGuess"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_are_legal() {
        assert!(Phase::ModeSelect.can_transition_to(Phase::Waiting));
        assert!(Phase::Waiting.can_transition_to(Phase::Discussion));
        assert!(Phase::Discussion.can_transition_to(Phase::Voting));
        assert!(Phase::Voting.can_transition_to(Phase::AwaitingGuess));
        assert!(Phase::Voting.can_transition_to(Phase::Ended));
        assert!(Phase::AwaitingGuess.can_transition_to(Phase::Ended));
    }

    #[test]
    fn test_revote_loop_is_legal() {
        assert!(Phase::Voting.can_transition_to(Phase::Voting));
    }

    #[test]
    fn test_backward_and_skipping_transitions_are_illegal() {
        assert!(!Phase::Waiting.can_transition_to(Phase::ModeSelect));
        assert!(!Phase::ModeSelect.can_transition_to(Phase::Discussion));
        assert!(!Phase::Waiting.can_transition_to(Phase::Voting));
        assert!(!Phase::Discussion.can_transition_to(Phase::AwaitingGuess));
        assert!(!Phase::Discussion.can_transition_to(Phase::Discussion));
        assert!(!Phase::AwaitingGuess.can_transition_to(Phase::Voting));
    }

    #[test]
    fn test_ended_is_terminal() {
        for target in [
            Phase::ModeSelect,
            Phase::Waiting,
            Phase::Discussion,
            Phase::Voting,
            Phase::AwaitingGuess,
            Phase::Ended,
        ] {
            assert!(!Phase::Ended.can_transition_to(target));
        }
    }

    #[test]
    fn test_is_lobby() {
        assert!(Phase::Waiting.is_lobby());
        assert!(!Phase::ModeSelect.is_lobby());
        assert!(!Phase::Discussion.is_lobby());
    }

    #[test]
    fn test_is_in_play() {
        assert!(!Phase::Waiting.is_in_play());
        assert!(Phase::Discussion.is_in_play());
        assert!(Phase::Voting.is_in_play());
        assert!(Phase::AwaitingGuess.is_in_play());
        assert!(!Phase::Ended.is_in_play());
    }

    #[test]
    fn test_display() {
        assert_eq!(Phase::AwaitingGuess.to_string(), "AwaitingGuess");
        assert_eq!(Phase::Voting.to_string(), "Voting");
    }
}
