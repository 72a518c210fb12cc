//! Replicated game state aggregate

use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::board::BoardState;
use crate::coords::{PlayerId, CACHE_SIZE};
use crate::deck::Deck;

/// Per-player bookkeeping
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Created at the player's first headquarters turn
    pub deck: Option<Deck>,
    /// Tokens committed from the cache this turn
    pub tokens_used_in_turn: u32,
    /// Read by the scheduler's end-turn predicate
    pub turn_ended: bool,
}

/// Snapshot replicated to every observer after each mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub battle: Option<Battle>,
    /// Players still owed an interactive battle turn, front first
    pub battle_turns: Vec<PlayerId>,
    pub board: BoardState,
    pub players: Vec<PlayerRecord>,
}

impl GameState {
    pub fn new(num_players: usize) -> Self {
        Self {
            battle: None,
            battle_turns: Vec::new(),
            board: BoardState::new(),
            players: vec![PlayerRecord::default(); num_players],
        }
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(player)
    }

    pub fn player_mut(&mut self, player: PlayerId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(player)
    }

    /// Whether the player may end the current turn
    ///
    /// No headquarters may stay in the cache, and committed plus cached tokens
    /// must stay below the cache size.
    pub fn is_turn_valid(&self, player: PlayerId) -> bool {
        let Some(record) = self.player(player) else {
            return false;
        };
        if self.board.cache(player).any(|hex| hex.is_hq()) {
            return false;
        }
        let cached = self.board.cache_count(player) as u32;
        record.tokens_used_in_turn + cached < CACHE_SIZE as u32
    }

    pub fn in_battle(&self) -> bool {
        self.battle.is_some()
    }

    /// Every deck is dealt out and every cache is empty
    pub fn tokens_exhausted(&self) -> bool {
        self.players.iter().enumerate().all(|(player, record)| {
            record
                .deck
                .as_ref()
                .is_some_and(|d| d.remaining() == 0 && d.all_hqs_drawn())
                && self.board.cache_count(player) == 0
        })
    }
}
