//! Error types
//!
//! Three kinds of failure are kept apart:
//! - [`InvalidMove`]: a rule violation by the acting player. Recovered locally,
//!   the state is left untouched and the player may retry.
//! - [`CoreError`]: a broken engine invariant. Callers should treat it as fatal.
//! - [`ArmyError`]: malformed army content, reported once at load time.

use crate::context::Phase;
use crate::coords::PlayerId;

/// A move rejected by the rules
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("move is not allowed in the {0:?} phase")]
    NotAllowed(Phase),
    #[error("cell is neither a cache slot nor a board hex")]
    InvalidCell,
    #[error("destination is another player's cache")]
    ForeignCache,
    #[error("cell is empty")]
    EmptyCell,
    #[error("token belongs to another player")]
    NotOwner,
    #[error("instant tokens cannot be moved or rotated")]
    InstantToken,
    #[error("destination is occupied")]
    Occupied,
    #[error("token was committed in an earlier turn")]
    AlreadyCommitted,
    #[error("no more tokens can be used this turn")]
    TurnLimitReached,
    #[error("cell is not a cache slot")]
    NotCacheSlot,
    #[error("instant token must carry exactly one ability")]
    AbilityCount,
    #[error("token is not an instant")]
    NotInstant,
    #[error("no instant handler for this ability")]
    NoHandler,
    #[error("instant handler rejected the target")]
    HandlerRejected,
    #[error("turn cannot end yet")]
    TurnIncomplete,
    #[error("no battle action is pending")]
    NoBattleStage,
    #[error("unit is not queued in this battle pass")]
    NotQueued,
    #[error("unit has no eligible battle action")]
    NoBattleAction,
    #[error("target is not eligible")]
    InvalidTarget,
}

/// Broken engine invariant
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("player {0} has no deck")]
    MissingDeck(PlayerId),
    #[error("battle hook invoked without an active battle")]
    NoBattle,
    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),
    #[error("no army assigned to player {0}")]
    NoArmyAssigned(PlayerId),
    #[error("unknown army: {0}")]
    UnknownArmy(String),
    #[error("unsupported player count: {0}")]
    PlayerCount(usize),
}

/// Malformed army definition
#[derive(Debug, thiserror::Error)]
pub enum ArmyError {
    #[error("failed to parse army: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("token {token}: angle {angle} is outside -1..=5")]
    InvalidAngle { token: String, angle: i32 },
    #[error("token {token}: shield angle {angle} is outside 0..=5")]
    InvalidShield { token: String, angle: u8 },
    #[error("army {0} declares no tokens")]
    Empty(String),
}
