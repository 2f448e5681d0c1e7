//! Game mode configurations.
//!
//! A mode fixes the phase durations, the player minimum, and the
//! elimination variant. The table is static; sessions reference modes
//! by name and the config is immutable once chosen.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How eliminations resolve for a mode. Each variant has a matching
/// strategy in [`crate::vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EliminationVariant {
    /// One impostor; eliminating anyone else opens their guess window.
    SingleImpostor,
    /// Exactly two impostors; voting loops until all are out or a crew
    /// member is eliminated.
    TeamImpostors,
    /// One impostor plus one decoy holding a wrong secret.
    ImpostorPlusDecoy,
    /// Impostor count scales with the roster, decoys scale with the
    /// remainder; voting loops like team mode.
    ChaosMulti,
}

/// Identifier for one of the fixed game modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeName {
    Normal,
    Speed,
    Marathon,
    Team,
    DoubleAgent,
    Chaos,
}

impl ModeName {
    /// All modes, in menu order.
    pub const ALL: [ModeName; 6] = [
        Self::Normal,
        Self::Speed,
        Self::Marathon,
        Self::Team,
        Self::DoubleAgent,
        Self::Chaos,
    ];

    /// The stable string form used in notices and by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Speed => "speed",
            Self::Marathon => "marathon",
            Self::Team => "team",
            Self::DoubleAgent => "double_agent",
            Self::Chaos => "chaos",
        }
    }

    /// This mode's configuration.
    pub fn config(&self) -> &'static ModeConfig {
        static NORMAL: ModeConfig = ModeConfig {
            name: ModeName::Normal,
            discussion: Duration::from_secs(300),
            voting: Duration::from_secs(60),
            guess: Duration::from_secs(30),
            min_players: 3,
            max_players: 8,
            variant: EliminationVariant::SingleImpostor,
        };
        static SPEED: ModeConfig = ModeConfig {
            name: ModeName::Speed,
            discussion: Duration::from_secs(120),
            voting: Duration::from_secs(30),
            guess: Duration::from_secs(20),
            min_players: 3,
            max_players: 8,
            variant: EliminationVariant::SingleImpostor,
        };
        static MARATHON: ModeConfig = ModeConfig {
            name: ModeName::Marathon,
            discussion: Duration::from_secs(600),
            voting: Duration::from_secs(90),
            guess: Duration::from_secs(45),
            min_players: 4,
            max_players: 8,
            variant: EliminationVariant::SingleImpostor,
        };
        static TEAM: ModeConfig = ModeConfig {
            name: ModeName::Team,
            discussion: Duration::from_secs(300),
            voting: Duration::from_secs(60),
            guess: Duration::from_secs(30),
            min_players: 6,
            max_players: 8,
            variant: EliminationVariant::TeamImpostors,
        };
        static DOUBLE_AGENT: ModeConfig = ModeConfig {
            name: ModeName::DoubleAgent,
            discussion: Duration::from_secs(300),
            voting: Duration::from_secs(60),
            guess: Duration::from_secs(30),
            min_players: 4,
            max_players: 8,
            variant: EliminationVariant::ImpostorPlusDecoy,
        };
        static CHAOS: ModeConfig = ModeConfig {
            name: ModeName::Chaos,
            discussion: Duration::from_secs(360),
            voting: Duration::from_secs(75),
            guess: Duration::from_secs(40),
            min_players: 8,
            max_players: 8,
            variant: EliminationVariant::ChaosMulti,
        };
        match self {
            Self::Normal => &NORMAL,
            Self::Speed => &SPEED,
            Self::Marathon => &MARATHON,
            Self::Team => &TEAM,
            Self::DoubleAgent => &DOUBLE_AGENT,
            Self::Chaos => &CHAOS,
        }
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or(())
    }
}

/// Immutable configuration for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeConfig {
    pub name: ModeName,
    /// Discussion phase length.
    pub discussion: Duration,
    /// Voting round length (re-vote rounds get the full duration again).
    pub voting: Duration,
    /// Guess window length.
    pub guess: Duration,
    /// Minimum roster size to begin.
    pub min_players: usize,
    /// Lobby capacity.
    pub max_players: usize,
    pub variant: EliminationVariant,
}
