//! Placed unit instances

use serde::{Deserialize, Serialize};

use crate::coords::PlayerId;
use crate::token::Token;

/// A unit on the board or in a cache
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    /// Owned copy of the token this unit was drawn as
    pub token: Token,
    /// Army the token was drawn from
    pub army: String,
    pub player: PlayerId,
    /// Facing offset in 60 degree steps (0-5)
    pub rotation: u8,
    /// Accumulated damage
    pub damage: u32,
    pub health: u32,
    pub attacked_in_battle: bool,
    pub damaged_in_battle: bool,
    /// Damage taken during the current initiative segment
    pub segment_damage: u32,
    /// Turn the unit was committed from its cache
    pub turn_used: Option<u32>,
}

impl Hex {
    pub fn new(player: PlayerId, army: impl Into<String>, token: Token) -> Self {
        Self {
            health: token.health,
            token,
            army: army.into(),
            player,
            rotation: 0,
            damage: 0,
            attacked_in_battle: false,
            damaged_in_battle: false,
            segment_damage: 0,
            turn_used: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.damage >= self.health
    }

    pub fn is_hq(&self) -> bool {
        self.token.hq
    }

    pub fn is_instant(&self) -> bool {
        self.token.instant
    }

    /// Absolute facing of a token-relative angle
    pub fn facing(&self, angle: u8) -> u8 {
        (angle + self.rotation) % 6
    }

    /// Record incoming damage
    pub fn take_damage(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.damage += amount;
        self.segment_damage += amount;
        self.damaged_in_battle = true;
    }
}
