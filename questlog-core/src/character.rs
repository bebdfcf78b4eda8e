//! Character progress: the leveling ledger.
//!
//! All operations take `&self` and return a new `Character`; the caller
//! decides when to persist.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const STARTING_THRESHOLD: u64 = 100;
pub const MAX_ENERGY: u8 = 100;

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Bad,
    Terrible,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Excellent, Mood::Good, Mood::Neutral, Mood::Bad, Mood::Terrible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| Error::invalid_enum("mood", s))
    }
}

/// Cosmetic unlocks granted by some achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorldElement {
    Tree,
    Flower,
    Stone,
    Water,
    House,
    Animal,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub level: u32,
    /// Progress toward the next level. Always below `experience_to_next_level`.
    pub experience: u64,
    pub experience_to_next_level: u64,
    /// 0..=100
    pub energy: u8,
    pub mood: Mood,
    #[serde(default)]
    pub world_elements: Vec<WorldElement>,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next_level: STARTING_THRESHOLD,
            energy: MAX_ENERGY,
            mood: Mood::Good,
            world_elements: Vec::new(),
        }
    }
}

impl Character {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add experience, levelling up as many times as the total allows.
    ///
    /// The threshold grows by x1.5 (floored) per level, so this has to loop
    /// rather than solve for the final level directly.
    pub fn add_experience(&self, amount: u64) -> Character {
        let mut next = self.clone();
        next.experience = next.experience.saturating_add(amount);
        // A threshold below the starting one (say, 0 from a hand-edited
        // profile) would never grow.
        next.experience_to_next_level = next.experience_to_next_level.max(STARTING_THRESHOLD);

        while next.experience >= next.experience_to_next_level {
            next.experience -= next.experience_to_next_level;
            next.level += 1;
            next.experience_to_next_level = next.experience_to_next_level * 3 / 2;
            tracing::debug!(
                level = next.level,
                threshold = next.experience_to_next_level,
                "character levelled up"
            );
        }

        next
    }

    /// Shift energy by `delta`, clamped to 0..=100.
    pub fn change_energy(&self, delta: i64) -> Character {
        let energy = (self.energy as i64).saturating_add(delta).clamp(0, MAX_ENERGY as i64);
        Character {
            energy: energy as u8,
            ..self.clone()
        }
    }

    pub fn with_mood(&self, mood: Mood) -> Character {
        Character {
            mood,
            ..self.clone()
        }
    }

    /// Unlock a world element; already-unlocked elements are left alone.
    pub fn unlock(&self, element: WorldElement) -> Character {
        let mut next = self.clone();
        if !next.world_elements.contains(&element) {
            next.world_elements.push(element);
        }
        next
    }
}
