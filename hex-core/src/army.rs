//! Army content - declarative token lists loaded from JSON

use std::path::Path;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ArmyError;
use crate::token::{AbilityKind, AttackKind, ModifierKind, Token};

/// Built-in armies shipped with the game
const BUILTIN_ARMIES: [&str; 2] = [
    include_str!("../../armies/moloch.json"),
    include_str!("../../armies/borgo.json"),
];

// ============================================================================
// JSON SHAPE
// ============================================================================

/// Army file as written by content authors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArmyDef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub tokens: Vec<TokenDef>,
}

/// Initiative is either a single value or a list
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitiativeDef {
    One(u32),
    Many(Vec<u32>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenDef {
    pub id: String,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub hq: bool,
    #[serde(default)]
    pub instant: bool,
    #[serde(default)]
    pub foundation: bool,
    #[serde(default)]
    pub health: Option<u32>,
    #[serde(default)]
    pub initiative: Option<InitiativeDef>,
    #[serde(default)]
    pub attacks: Vec<AttackDef>,
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,
    #[serde(default)]
    pub modifiers: Vec<ModifierDef>,
    #[serde(default)]
    pub shields: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttackDef {
    #[serde(rename = "type")]
    pub kind: AttackKind,
    #[serde(default)]
    pub angle: Option<i32>,
    #[serde(default)]
    pub damage: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityDef {
    #[serde(rename = "type")]
    pub kind: AbilityKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModifierDef {
    #[serde(rename = "type")]
    pub kind: ModifierKind,
    #[serde(default)]
    pub value: Option<i32>,
    #[serde(default)]
    pub hostile: bool,
    #[serde(default)]
    pub angle: Option<i32>,
}

// ============================================================================
// NORMALIZED ARMY
// ============================================================================

/// One normalized token kind and how many copies the army holds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyEntry {
    pub token: Token,
    pub count: u32,
}

/// Army with every token normalized
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub id: String,
    pub name: String,
    pub entries: Vec<ArmyEntry>,
}

impl Army {
    pub fn from_def(def: ArmyDef) -> Result<Self, ArmyError> {
        if def.tokens.is_empty() {
            return Err(ArmyError::Empty(def.id));
        }

        let entries = def
            .tokens
            .iter()
            .map(|t| {
                Ok(ArmyEntry {
                    token: Token::from_def(t)?,
                    count: t.count.unwrap_or(1),
                })
            })
            .collect::<Result<Vec<_>, ArmyError>>()?;

        Ok(Self {
            name: def.name.unwrap_or_else(|| def.id.clone()),
            id: def.id,
            entries,
        })
    }

    /// Parse and normalize an army from JSON text
    pub fn from_json(json: &str) -> Result<Self, ArmyError> {
        let def: ArmyDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    /// Total number of tokens, counting copies
    pub fn token_count(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }
}

// ============================================================================
// ARMY BOOK
// ============================================================================

/// Armies available to a match, keyed by id
#[derive(Clone, Debug, Default)]
pub struct ArmyBook {
    armies: FxHashMap<String, Army>,
}

impl ArmyBook {
    /// Book holding the built-in armies
    pub fn builtin() -> Result<Self, ArmyError> {
        let mut book = Self::default();
        for json in BUILTIN_ARMIES {
            book.insert(Army::from_json(json)?);
        }
        Ok(book)
    }

    /// Load every `*.json` file in a directory
    ///
    /// An army without an `id` takes the file stem as its id.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut book = Self::default();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read army directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut def: ArmyDef = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            if def.id.is_empty() {
                def.id = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
            }

            let army = Army::from_def(def)
                .with_context(|| format!("Invalid army in {}", path.display()))?;
            tracing::debug!("Loaded army {} ({} tokens)", army.id, army.token_count());
            book.insert(army);
        }

        Ok(book)
    }

    pub fn insert(&mut self, army: Army) {
        self.armies.insert(army.id.clone(), army);
    }

    pub fn get(&self, id: &str) -> Option<&Army> {
        self.armies.get(id)
    }

    /// Army ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.armies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.armies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armies.is_empty()
    }
}
