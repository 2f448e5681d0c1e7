//! Role assignment: partitioning a roster into impostors, decoys, and
//! crew, and picking the secrets.
//!
//! Pure with respect to the engine: no locking, no session access. All
//! randomness comes through the caller's `Rng`, so tests drive it with a
//! seeded `StdRng`. Roster-size minimums are enforced by the caller
//! *before* this module is invoked.

use std::collections::{HashMap, HashSet};

use molehunt_protocol::PlayerId;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::deck::SecretDeck;
use crate::mode::EliminationVariant;

/// The result of dealing one game.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// The canonical secret known to genuine crew.
    pub secret: String,
    /// Impostor ids. At least one; two or more in team/chaos variants.
    pub impostors: HashSet<PlayerId>,
    /// Decoy → the wrong secret dealt to them. Always disjoint from
    /// `impostors`; decoys never hold the canonical secret.
    pub decoys: HashMap<PlayerId, String>,
}

/// Chaos variant scaling: impostors from the roster, then decoys from
/// whoever is left.
fn chaos_impostor_count(roster_size: usize) -> usize {
    (roster_size / 3).max(2)
}

fn chaos_decoy_count(remainder: usize) -> usize {
    (remainder / 3).max(1)
}

/// Deals roles and secrets for `variant` over `roster`.
pub fn assign(
    roster: &[PlayerId],
    variant: EliminationVariant,
    deck: &SecretDeck,
    rng: &mut impl Rng,
) -> Assignment {
    let secret = deck.draw(rng).to_string();
    let mut impostors = HashSet::new();
    let mut decoys = HashMap::new();

    match variant {
        EliminationVariant::SingleImpostor => {
            impostors.insert(*roster.choose(rng).expect("roster is non-empty"));
        }
        EliminationVariant::TeamImpostors => {
            impostors.extend(roster.choose_multiple(rng, 2).copied());
        }
        EliminationVariant::ImpostorPlusDecoy => {
            let impostor = *roster.choose(rng).expect("roster is non-empty");
            impostors.insert(impostor);

            let remainder: Vec<PlayerId> =
                roster.iter().copied().filter(|p| *p != impostor).collect();
            let decoy = *remainder.choose(rng).expect("roster has at least two");
            let wrong = deck.draw_excluding(rng, &secret).to_string();
            decoys.insert(decoy, wrong);
        }
        EliminationVariant::ChaosMulti => {
            impostors.extend(
                roster
                    .choose_multiple(rng, chaos_impostor_count(roster.len()))
                    .copied(),
            );
            let remainder: Vec<PlayerId> = roster
                .iter()
                .copied()
                .filter(|p| !impostors.contains(p))
                .collect();
            // Each decoy draws independently; they need not share the
            // same wrong secret.
            for decoy in remainder.choose_multiple(rng, chaos_decoy_count(remainder.len())) {
                let wrong = deck.draw_excluding(rng, &secret).to_string();
                decoys.insert(*decoy, wrong);
            }
        }
    }

    Assignment { secret, impostors, decoys }
}
