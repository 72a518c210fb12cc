//! Game runner - plays one bot-driven match

use anyhow::{bail, Context};
use hex_core::{GameState, HexGame, Move, PlayerId, TraceEvent};

use crate::bot::RandomBot;
use crate::config::RunnerConfig;
use crate::flow::Flow;
use crate::soak::check_invariants;

/// Outcome of a single match
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub seed: u64,
    /// Turns opened by the scheduler
    pub turns: u32,
    /// Accepted moves in play order
    pub moves: Vec<(PlayerId, Move)>,
    /// Battles started
    pub battles: usize,
    pub final_state: GameState,
    pub trace: Vec<TraceEvent>,
}

impl MatchOutcome {
    /// Whether every deck and cache ran dry before the turn limit
    pub fn exhausted(&self) -> bool {
        self.final_state.tokens_exhausted()
    }
}

/// Play a match with one random bot for all seats
pub fn play_game(game: HexGame, config: &RunnerConfig) -> anyhow::Result<MatchOutcome> {
    let mut flow = Flow::new(game, config.seed).context("failed to start match")?;
    let mut bot = RandomBot::new(config.seed.wrapping_add(1), config.instant_probability);
    let mut moves = Vec::new();
    let mut moves_this_turn = 0usize;
    let mut last_turn = flow.turn();

    while flow.turn() <= config.max_turns && !flow.state().tokens_exhausted() {
        let player = flow.current_player();
        let Some(mv) = bot.choose(&flow) else {
            bail!("no legal move for player {player} in turn {}", flow.turn());
        };

        flow.make_move(player, mv)
            .with_context(|| format!("move {mv:?} by player {player} rejected"))?;
        moves.push((player, mv));

        if config.check_invariants {
            check_invariants(flow.state()).with_context(|| format!("after {mv:?} by player {player}"))?;
        }

        if flow.turn() == last_turn {
            moves_this_turn += 1;
            if moves_this_turn > config.max_moves_per_turn {
                bail!("turn {last_turn} exceeded {} moves", config.max_moves_per_turn);
            }
        } else {
            last_turn = flow.turn();
            moves_this_turn = 0;
        }
    }

    let battles = flow
        .trace()
        .iter()
        .filter(|e| matches!(e, TraceEvent::BattleStarted { .. }))
        .count();
    tracing::debug!(seed = config.seed, turns = flow.turn(), moves = moves.len(), battles, "Match finished");

    Ok(MatchOutcome {
        seed: config.seed,
        turns: flow.turn(),
        moves,
        battles,
        final_state: flow.state().clone(),
        trace: flow.trace().to_vec(),
    })
}
