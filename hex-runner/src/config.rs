//! Configuration types for automated play

use serde::{Deserialize, Serialize};

/// Settings for one bot-driven match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Seed for the match RNG; the bot uses the next seed up
    pub seed: u64,
    /// Stop after this many turns
    pub max_turns: u32,
    /// Chance the bot plays an instant when one is legal
    pub instant_probability: f64,
    /// Abort a turn that takes more moves than this
    pub max_moves_per_turn: usize,
    /// Check board invariants after every move
    pub check_invariants: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_turns: 200,
            instant_probability: 0.3,
            max_moves_per_turn: 32,
            check_invariants: true,
        }
    }
}

impl RunnerConfig {
    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set turn limit
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Set how eagerly the bot plays instants
    pub fn with_instant_probability(mut self, probability: f64) -> Self {
        self.instant_probability = probability.clamp(0.0, 1.0);
        self
    }
}
