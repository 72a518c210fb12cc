//! Match configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::coords::MAX_PLAYERS;
use crate::error::CoreError;

/// Health given to every headquarters token
pub const DEFAULT_HQ_HEALTH: u32 = 20;

/// Per-match settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seated players (2 to MAX_PLAYERS)
    pub num_players: usize,
    /// Army id per seat
    pub armies: Vec<String>,
    /// Health of headquarters tokens
    pub hq_health: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 2,
            armies: vec!["moloch".to_string(), "borgo".to_string()],
            hq_health: DEFAULT_HQ_HEALTH,
        }
    }
}

impl GameConfig {
    /// Load a config from a JSON file, missing fields take defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Seat players with the given armies, one per seat
    pub fn with_armies<S: Into<String>>(mut self, armies: impl IntoIterator<Item = S>) -> Self {
        self.armies = armies.into_iter().map(Into::into).collect();
        self.num_players = self.armies.len();
        self
    }

    /// Set headquarters health
    pub fn with_hq_health(mut self, hq_health: u32) -> Self {
        self.hq_health = hq_health;
        self
    }

    /// Check the seat count and that every seat has an army
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(2..=MAX_PLAYERS).contains(&self.num_players) {
            return Err(CoreError::PlayerCount(self.num_players));
        }
        if self.armies.len() < self.num_players {
            return Err(CoreError::NoArmyAssigned(self.armies.len()));
        }
        Ok(())
    }
}
