//! Random legal-move bot
//!
//! Candidates are tried in priority groups. Each group is shuffled and the
//! first candidate the scheduler would accept is played.

use hex_core::battle::{heal_targets, post_actions_of, pre_actions_of};
use hex_core::coords::{board_hexes, cache_slot};
use hex_core::{Move, Phase, PlayerId, CACHE_SIZE};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::flow::Flow;

/// Chance of placing a token when a placement is available
const PLACE_PROBABILITY: f64 = 0.85;

/// Bot choosing uniformly among legal moves, with a mild preference order
#[derive(Clone, Debug)]
pub struct RandomBot {
    rng: ChaCha8Rng,
    instant_probability: f64,
}

impl RandomBot {
    pub fn new(seed: u64, instant_probability: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            instant_probability: instant_probability.clamp(0.0, 1.0),
        }
    }

    /// Pick a move for the player holding the turn
    pub fn choose(&mut self, flow: &Flow) -> Option<Move> {
        let player = flow.current_player();
        let groups = match flow.phase() {
            Phase::Battle => self.battle_groups(flow, player),
            Phase::HqSetup | Phase::Normal => self.placement_groups(flow, player),
        };

        for mut group in groups {
            group.shuffle(&mut self.rng);
            if let Some(mv) = group.into_iter().find(|&mv| flow.try_move(player, mv)) {
                return Some(mv);
            }
        }
        None
    }

    fn placement_groups(&mut self, flow: &Flow, player: PlayerId) -> Vec<Vec<Move>> {
        let board = &flow.state().board;
        let slots: Vec<_> = (0..CACHE_SIZE).map(|i| cache_slot(player, i)).collect();
        let hexes: Vec<_> = board_hexes().map(|c| c.to_index()).collect();
        let empty: Vec<_> = hexes.iter().copied().filter(|&pos| board.is_empty_at(pos)).collect();

        let mut hqs = Vec::new();
        let mut instants = Vec::new();
        let mut placements = Vec::new();
        for &from in &slots {
            let Some(hex) = board.get(from) else {
                continue;
            };
            if hex.is_hq() {
                hqs.extend(empty.iter().map(|&to| Move::MoveToken { from, to }));
            } else if hex.is_instant() {
                instants.push(Move::UseInstantToken { at: from, on: None });
                instants.extend(hexes.iter().map(|&on| Move::UseInstantToken { at: from, on: Some(on) }));
            } else {
                placements.extend(empty.iter().map(|&to| Move::MoveToken { from, to }));
            }
        }

        if !self.rng.gen_bool(self.instant_probability) {
            instants.clear();
        }
        if !self.rng.gen_bool(PLACE_PROBABILITY) {
            placements.clear();
        }

        // Only tokens committed this turn get a rotation, and only once
        let rotations = board
            .occupied()
            .filter(|(hex, _)| hex.player == player && hex.turn_used == Some(flow.turn()) && hex.rotation == 0)
            .flat_map(|(_, c)| (1..6).map(move |steps| Move::RotateToken { pos: c.to_index(), steps }))
            .collect();

        let discards = slots
            .iter()
            .filter(|&&pos| !board.is_empty_at(pos))
            .map(|&pos| Move::DiscardCache { pos: Some(pos) })
            .collect();

        vec![hqs, instants, placements, rotations, vec![Move::EndTurn], discards]
    }

    fn battle_groups(&self, flow: &Flow, player: PlayerId) -> Vec<Vec<Move>> {
        let state = flow.state();
        let Some(battle) = state.battle.as_ref() else {
            return vec![vec![Move::EndTurn]];
        };

        let pre = battle
            .pre_actions
            .iter()
            .filter(|&&at| state.board.get(at).is_some_and(|h| h.player == player && !pre_actions_of(h).is_empty()))
            .map(|&at| Move::BattlePreAction { at, on: None })
            .collect();

        let post = battle
            .post_actions
            .iter()
            .filter(|&&at| state.board.get(at).is_some_and(|h| h.player == player && !post_actions_of(h).is_empty()))
            .flat_map(|&at| {
                heal_targets(&state.board, at)
                    .into_iter()
                    .map(move |on| Move::BattlePostAction { at, on: Some(on) })
            })
            .collect();

        vec![pre, post, vec![Move::EndTurn]]
    }
}
