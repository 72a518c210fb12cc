//! Token definitions
//!
//! A [`Token`] is the normalized, fully owned description of one card drawn
//! from a deck. Capabilities are closed enums: an unknown `type` tag in army
//! content fails at load time, never during a battle.

use serde::{Deserialize, Serialize};

use crate::army::{AttackDef, InitiativeDef, ModifierDef, TokenDef};
use crate::error::ArmyError;

/// Angle value meaning "all six facings"
pub const ALL_FACINGS: i32 = -1;

/// One-shot and battle abilities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKind {
    Airstrike, // Instant: 1 damage on a hex and its six neighbours
    Battle,    // Instant: starts the battle phase
    Grenade,   // Pre-action: detonate, damaging adjacent enemies
}

impl AbilityKind {
    /// Whether the ability is resolved through the instant handler registry
    pub fn is_instant(self) -> bool {
        matches!(self, AbilityKind::Airstrike | AbilityKind::Battle)
    }

    /// Action offered before the base attacks of a segment
    pub fn pre_action(self) -> Option<BattleAction> {
        match self {
            AbilityKind::Grenade => Some(BattleAction::Detonate),
            AbilityKind::Airstrike | AbilityKind::Battle => None,
        }
    }
}

/// Attack types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    Melee,  // Adjacent hex only
    Ranged, // First enemy in line, stopped by shields
    Gauss,  // Every enemy in line, ignores shields
}

impl AttackKind {
    pub fn is_shieldable(self) -> bool {
        self == AttackKind::Ranged
    }

    /// Attacks have no pre-battle behaviour yet
    pub fn pre_action(self) -> Option<BattleAction> {
        None
    }
}

/// Modifier types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKind {
    Melee,  // Adjusts melee damage of the unit it points at
    Ranged, // Adjusts ranged and gauss damage of the unit it points at
    Medic,  // Post-action: cancels damage of the friend it points at
}

impl ModifierKind {
    /// Whether this modifier adjusts the given attack type
    pub fn affects(self, attack: AttackKind) -> bool {
        match self {
            ModifierKind::Melee => attack == AttackKind::Melee,
            ModifierKind::Ranged => matches!(attack, AttackKind::Ranged | AttackKind::Gauss),
            ModifierKind::Medic => false,
        }
    }

    pub fn pre_action(self) -> Option<BattleAction> {
        None
    }

    /// Action offered after the base attacks of a segment
    pub fn post_action(self) -> Option<BattleAction> {
        match self {
            ModifierKind::Medic => Some(BattleAction::Heal),
            ModifierKind::Melee | ModifierKind::Ranged => None,
        }
    }
}

/// Interactive battle actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleAction {
    Detonate,
    Heal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    #[serde(rename = "type")]
    pub kind: AbilityKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    #[serde(rename = "type")]
    pub kind: AttackKind,
    /// Facing relative to the unit's rotation (0-5)
    pub angle: u8,
    pub damage: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(rename = "type")]
    pub kind: ModifierKind,
    pub value: i32,
    /// Applies to opposing units instead of friends
    pub hostile: bool,
    /// Facing relative to the unit's rotation (0-5)
    pub angle: u8,
}

/// Normalized token description
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub hq: bool,
    pub instant: bool,
    pub foundation: bool,
    pub health: u32,
    /// Sorted descending
    pub initiative: Vec<u32>,
    pub attacks: Vec<Attack>,
    pub abilities: Vec<Ability>,
    pub modifiers: Vec<Modifier>,
    /// Facings relative to the unit's rotation that block shieldable attacks
    pub shields: Vec<u8>,
}

impl Token {
    /// Build a token from its army declaration, filling in defaults
    pub fn from_def(def: &TokenDef) -> Result<Self, ArmyError> {
        let mut attacks = Vec::new();
        for attack in &def.attacks {
            for angle in expand_angle(&def.id, attack.angle)? {
                attacks.push(create_attack(attack, angle));
            }
        }

        let mut modifiers = Vec::new();
        for modifier in &def.modifiers {
            for angle in expand_angle(&def.id, modifier.angle)? {
                modifiers.push(create_modifier(modifier, angle));
            }
        }

        let mut initiative = match &def.initiative {
            Some(InitiativeDef::One(value)) => vec![*value],
            Some(InitiativeDef::Many(values)) => values.clone(),
            None => Vec::new(),
        };
        initiative.sort_unstable_by(|a, b| b.cmp(a));

        if let Some(&angle) = def.shields.iter().find(|&&a| a > 5) {
            return Err(ArmyError::InvalidShield { token: def.id.clone(), angle });
        }

        Ok(Self {
            id: def.id.clone(),
            hq: def.hq,
            instant: def.instant,
            foundation: def.foundation,
            health: def.health.unwrap_or(1).max(1),
            initiative,
            attacks,
            abilities: def.abilities.iter().map(|a| Ability { kind: a.kind }).collect(),
            modifiers,
            shields: def.shields.clone(),
        })
    }

    /// Whether the unit acts in the given initiative segment
    pub fn acts_at(&self, initiative: u32) -> bool {
        self.initiative.contains(&initiative)
    }

    /// Highest initiative value, if any
    pub fn max_initiative(&self) -> Option<u32> {
        self.initiative.first().copied()
    }
}

fn create_attack(def: &AttackDef, angle: u8) -> Attack {
    Attack {
        kind: def.kind,
        angle,
        damage: def.damage.unwrap_or(1),
    }
}

fn create_modifier(def: &ModifierDef, angle: u8) -> Modifier {
    Modifier {
        kind: def.kind,
        value: def.value.unwrap_or(1),
        hostile: def.hostile,
        angle,
    }
}

/// Expand a declared angle into concrete facings, facing 0 first for `-1`
fn expand_angle(token: &str, angle: Option<i32>) -> Result<Vec<u8>, ArmyError> {
    match angle.unwrap_or(0) {
        ALL_FACINGS => Ok((0..6).collect()),
        a @ 0..=5 => Ok(vec![a as u8]),
        a => Err(ArmyError::InvalidAngle { token: token.to_string(), angle: a }),
    }
}
