//! Hex Core - Rules and battle engine
//!
//! This crate provides the game logic for Hex:
//! - Board geometry (brick-offset hex grid with player caches)
//! - Token model and army content
//! - Decks, board state and the replicated game state
//! - Move handlers and instant abilities
//! - Initiative-based battle resolution
//! - Phase/turn hooks driven by an external scheduler

pub mod army;
pub mod battle;
pub mod board;
pub mod config;
pub mod context;
pub mod coords;
pub mod deck;
pub mod error;
pub mod hex;
pub mod instant;
pub mod moves;
pub mod phase;
pub mod state;
pub mod token;

// Re-exports for convenient access
pub use army::{Army, ArmyBook};
pub use battle::{Battle, BattleStage};
pub use board::BoardState;
pub use config::GameConfig;
pub use context::{Ctx, Events, FlowRequest, Phase, TraceEvent};
pub use coords::{Coordinates, PlayerId, Pos, CACHE_SIZE, CELLS_SIZE, MAX_PLAYERS};
pub use deck::{Deck, RandomSource};
pub use error::{ArmyError, CoreError, InvalidMove};
pub use hex::Hex;
pub use moves::{Move, MoveKind};
pub use phase::{HexGame, TurnOrder};
pub use state::{GameState, PlayerRecord};
pub use token::{AbilityKind, AttackKind, BattleAction, ModifierKind, Token};
