//! Round options
//!
//! Everything the menus can customize about a round lives here so the
//! sim itself stays data-driven.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BRITTLE_COUNT;

/// How many creeps of each species a round starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreepCensus {
    pub purple: u32,
    pub white: u32,
    pub red: u32,
    pub cyan: u32,
    pub yellow: u32,
}

impl CreepCensus {
    /// Default census: 6 purple creeps plus 7 specials drawn at random,
    /// capped at 2 white and 3 of each other special species.
    pub fn standard<R: Rng>(rng: &mut R) -> Self {
        let mut census = Self {
            purple: 6,
            white: 0,
            red: 0,
            cyan: 0,
            yellow: 0,
        };

        let mut remaining = 7;
        while remaining > 0 {
            let pick = *[0u8, 1, 2, 3].choose(rng).unwrap_or(&0);
            let (slot, cap) = match pick {
                0 => (&mut census.white, 2),
                1 => (&mut census.red, 3),
                2 => (&mut census.cyan, 3),
                _ => (&mut census.yellow, 3),
            };
            if *slot >= cap {
                continue;
            }
            *slot += 1;
            remaining -= 1;
        }

        census
    }

    pub fn total(&self) -> u32 {
        self.purple + self.white + self.red + self.cyan + self.yellow
    }
}

/// Options for one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Two-player mode adds a second start position at the far corner
    pub two_player: bool,
    /// Number of brittle cells scattered over the level at setup
    pub brittle_count: usize,
    /// Explicit creep census; `None` draws the standard random one
    pub census: Option<CreepCensus>,
}

impl RoundConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            two_player: false,
            brittle_count: DEFAULT_BRITTLE_COUNT,
            census: None,
        }
    }

    pub fn two_player(mut self) -> Self {
        self.two_player = true;
        self
    }

    pub fn with_brittle_count(mut self, count: usize) -> Self {
        self.brittle_count = count;
        self
    }

    pub fn with_census(mut self, census: CreepCensus) -> Self {
        self.census = Some(census);
        self
    }
}
