//! The secret deck: the pool of locations a game can be about.

use rand::Rng;
use rand::seq::IndexedRandom;

/// The standard deck, grouped by theme. Categories only matter for
/// maintenance; draws are uniform over the flattened list.
const STANDARD: &[(&str, &[&str])] = &[
    ("city", &[
        "Bank", "Train Station", "Police Station", "Fire Station",
        "Shopping Mall", "Parking Garage", "Post Office", "Apartment Complex",
        "Metro Station", "Taxi Stand", "Highway Toll Booth", "Train Compartment",
    ]),
    ("education", &[
        "University", "Kindergarten", "Science Lab", "Art Studio",
        "Debate Hall", "Library", "School",
    ]),
    ("medical", &[
        "Hospital", "Dentist Office", "Pharmacy",
        "Veterinary Clinic", "Psychiatric Hospital",
    ]),
    ("travel", &[
        "Airport", "Space Station", "Cruise Ship",
        "Border Checkpoint", "Ferry Terminal", "Airplane",
    ]),
    ("entertainment", &[
        "Cinema", "Ice Cream Shop", "Nightclub", "Game Arcade",
        "Buffet Restaurant", "Karaoke Bar", "Bowling Alley", "Theme Park",
    ]),
    ("fictional", &[
        "Wizard School", "Supervillain Lair", "Zombie Apocalypse Shelter",
        "Pirate Ship", "Alien Planet", "Time Machine",
    ]),
    ("historical", &[
        "Roman Colosseum", "Medieval Castle", "Ancient Pyramid",
        "World War Bunker", "Samurai Dojo", "Wild West Saloon",
    ]),
    ("scientific", &[
        "Nuclear Reactor", "Control Room", "Space Research Center",
        "Submarine", "Secret Lab", "Particle Accelerator",
    ]),
    ("outdoor", &[
        "Beach", "Forest Camp", "Waterfall", "Hiking Trail",
        "Farm", "Desert Camp", "Jungle Safari",
    ]),
];

/// A pool of secrets to draw from.
///
/// Requires at least two entries so a decoy can always receive a secret
/// different from the canonical one.
#[derive(Debug, Clone)]
pub struct SecretDeck {
    secrets: Vec<String>,
}

impl SecretDeck {
    /// The built-in deck.
    pub fn standard() -> Self {
        Self {
            secrets: STANDARD
                .iter()
                .flat_map(|(_, entries)| entries.iter().map(|s| s.to_string()))
                .collect(),
        }
    }

    /// A deck over custom secrets. Panics if fewer than two are given;
    /// a one-card deck cannot support decoys.
    pub fn with_secrets(secrets: Vec<String>) -> Self {
        assert!(secrets.len() >= 2, "a deck needs at least two secrets");
        Self { secrets }
    }

    /// Number of secrets in the deck.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the deck is empty. Never true for a constructed deck.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Draws one secret uniformly.
    pub fn draw(&self, rng: &mut impl Rng) -> &str {
        self.secrets
            .choose(rng)
            .expect("deck is never empty")
    }

    /// Draws one secret uniformly from all entries except `excluded`.
    pub fn draw_excluding(&self, rng: &mut impl Rng, excluded: &str) -> &str {
        loop {
            let candidate = self.draw(rng);
            if candidate != excluded {
                return candidate;
            }
        }
    }
}

/// Forgiving comparison of an impostor's guess against the canonical
/// secret: case/whitespace-insensitive, accepting exact matches,
/// containment either way, or near-misses (length within 2 and at most
/// 2 differing characters).
pub fn matches_guess(canonical: &str, guess: &str) -> bool {
    let canonical = canonical.trim().to_lowercase();
    let guess = guess.trim().to_lowercase();
    if guess.is_empty() {
        return false;
    }
    if guess == canonical || canonical.contains(&guess) || guess.contains(&canonical) {
        return true;
    }
    let len_gap = canonical.chars().count().abs_diff(guess.chars().count());
    if len_gap > 2 {
        return false;
    }
    let mismatches = canonical
        .chars()
        .zip(guess.chars())
        .filter(|(a, b)| a != b)
        .count();
    mismatches <= 2
}
