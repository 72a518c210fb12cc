//! Invariant checks and parallel soak runs

use hex_core::coords::{cache_owner, is_cache_slot};
use hex_core::{GameState, HexGame, PlayerId, Pos, CACHE_SIZE, CELLS_SIZE};
use rayon::prelude::*;

use crate::config::RunnerConfig;
use crate::game_runner::{play_game, MatchOutcome};

/// Broken board invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("dead unit left at {0} outside a battle")]
    DeadUnit(Pos),
    #[error("unit of player {player} sits in the cache slot {pos} of another player")]
    ForeignCacheUnit { pos: Pos, player: PlayerId },
    #[error("player {player} holds {count} headquarters")]
    TooManyHqs { player: PlayerId, count: usize },
    #[error("player {player} committed {used} tokens in one turn")]
    UsageOverflow { player: PlayerId, used: u32 },
}

/// Check the rules every reachable state must satisfy
pub fn check_invariants(state: &GameState) -> Result<(), Violation> {
    let mut hqs = vec![0usize; state.players.len()];

    for pos in 0..CELLS_SIZE {
        let Some(hex) = state.board.get(pos) else {
            continue;
        };
        if hex.is_dead() && !state.in_battle() {
            return Err(Violation::DeadUnit(pos));
        }
        if is_cache_slot(pos) && cache_owner(pos) != Some(hex.player) {
            return Err(Violation::ForeignCacheUnit { pos, player: hex.player });
        }
        if hex.is_hq() {
            if let Some(count) = hqs.get_mut(hex.player) {
                *count += 1;
            }
        }
    }

    if let Some((player, &count)) = hqs.iter().enumerate().find(|&(_, &c)| c > CACHE_SIZE) {
        return Err(Violation::TooManyHqs { player, count });
    }

    for (player, record) in state.players.iter().enumerate() {
        if record.tokens_used_in_turn >= CACHE_SIZE as u32 {
            return Err(Violation::UsageOverflow {
                player,
                used: record.tokens_used_in_turn,
            });
        }
    }
    Ok(())
}

/// Summary of a batch of seeded matches
#[derive(Clone, Debug, Default)]
pub struct SoakReport {
    /// Matches that ran to their end
    pub completed: usize,
    /// Seed and error text of every match that failed
    pub failures: Vec<(u64, String)>,
    /// Battles fought across all completed matches
    pub battles: usize,
    /// Average moves per completed match
    pub avg_moves: f32,
}

impl SoakReport {
    fn from_results(results: Vec<(u64, anyhow::Result<MatchOutcome>)>) -> Self {
        let mut report = SoakReport::default();
        let mut total_moves = 0usize;

        for (seed, result) in results {
            match result {
                Ok(outcome) => {
                    report.completed += 1;
                    report.battles += outcome.battles;
                    total_moves += outcome.moves.len();
                }
                Err(err) => report.failures.push((seed, format!("{err:#}"))),
            }
        }

        if report.completed > 0 {
            report.avg_moves = total_moves as f32 / report.completed as f32;
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Play `games` matches in parallel, seeds counting up from the config seed
pub fn soak(game: &HexGame, config: &RunnerConfig, games: usize) -> SoakReport {
    let results: Vec<_> = (0..games as u64)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed.wrapping_add(i);
            let run = config.clone().with_seed(seed);
            (seed, play_game(game.clone(), &run))
        })
        .collect();

    let report = SoakReport::from_results(results);
    tracing::info!(
        completed = report.completed,
        failures = report.failures.len(),
        battles = report.battles,
        "Soak finished"
    );
    report
}
