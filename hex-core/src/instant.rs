//! Instant ability handlers
//!
//! A handler returns `false` to reject the play. A rejecting handler must not
//! have touched the state.

use crate::context::{Ctx, Phase};
use crate::coords::{from_index, Pos};
use crate::state::GameState;
use crate::token::AbilityKind;

/// Resolution function for one instant ability
pub type InstantHandler = fn(&mut GameState, &mut Ctx, Option<Pos>) -> bool;

/// Look up the handler for an ability
pub fn handler_for(kind: AbilityKind) -> Option<InstantHandler> {
    match kind {
        AbilityKind::Airstrike => Some(airstrike),
        AbilityKind::Battle => Some(battle),
        AbilityKind::Grenade => None,
    }
}

/// One damage to every non-headquarters unit on the target and its six neighbours
fn airstrike(state: &mut GameState, _ctx: &mut Ctx, target: Option<Pos>) -> bool {
    let Some(center) = target.and_then(from_index).filter(|c| c.is_valid()) else {
        return false;
    };

    let mut cells = vec![center];
    for facing in 0..6 {
        let cell = center.neighbor(facing);
        if !cell.is_valid() {
            return false;
        }
        cells.push(cell);
    }

    for cell in cells {
        let pos = cell.to_index();
        let Some(hex) = state.board.get_mut(pos) else {
            continue;
        };
        if hex.is_hq() {
            continue;
        }
        hex.damage += 1;
        if hex.is_dead() {
            state.board.remove(pos);
        }
    }
    true
}

/// Start a battle and end the acting player's turn
fn battle(state: &mut GameState, ctx: &mut Ctx, _target: Option<Pos>) -> bool {
    let player = ctx.current_player;
    if !state.is_turn_valid(player) {
        return false;
    }

    ctx.end_phase(Phase::Battle);
    if let Some(record) = state.player_mut(player) {
        record.turn_ended = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Events, FlowRequest};
    use crate::coords::{cache_slot, to_index};
    use crate::hex::Hex;
    use crate::moves::use_instant_token;
    use crate::token::Token;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn unit(player: usize, json: serde_json::Value) -> Hex {
        Hex::new(player, "test", Token::from_def(&serde_json::from_value(json).unwrap()).unwrap())
    }

    fn airstrike_token(player: usize) -> Hex {
        unit(
            player,
            serde_json::json!({ "id": "airstrike", "instant": true, "abilities": [ { "type": "airstrike" } ] }),
        )
    }

    fn run<T>(player: usize, f: impl FnOnce(&mut Ctx) -> T) -> (T, Events) {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut events = Events::new();
        let result = {
            let mut ctx = Ctx {
                current_player: player,
                num_players: 2,
                turn: 1,
                phase: Phase::Normal,
                random: &mut rng,
                events: &mut events,
            };
            f(&mut ctx)
        };
        (result, events)
    }

    #[test]
    fn test_registry() {
        assert!(handler_for(AbilityKind::Airstrike).is_some());
        assert!(handler_for(AbilityKind::Battle).is_some());
        assert!(handler_for(AbilityKind::Grenade).is_none());
    }

    #[test]
    fn test_airstrike_damages_flower() {
        let mut state = GameState::new(2);
        let center = to_index(2, 4);
        state.board.put(cache_slot(0, 0), airstrike_token(0));
        state.board.put(center, unit(1, serde_json::json!({ "id": "tough", "health": 2 })));
        state.board.put(to_index(2, 2), unit(0, serde_json::json!({ "id": "own" })));
        state.board.put(to_index(3, 5), unit(1, serde_json::json!({ "id": "hq", "hq": true, "health": 5 })));
        state.board.put(to_index(2, 0), unit(1, serde_json::json!({ "id": "far" })));

        let (result, _) = run(0, |ctx| use_instant_token(&mut state, ctx, cache_slot(0, 0), Some(center)));
        result.unwrap();

        assert_eq!(state.board.get(center).unwrap().damage, 1);
        // Friendly fire kills the one-health unit
        assert!(state.board.is_empty_at(to_index(2, 2)));
        assert_eq!(state.board.get(to_index(3, 5)).unwrap().damage, 0);
        assert_eq!(state.board.get(to_index(2, 0)).unwrap().damage, 0);
        // The instant is consumed
        assert!(state.board.is_empty_at(cache_slot(0, 0)));
        assert_eq!(state.players[0].tokens_used_in_turn, 1);
    }

    #[test]
    fn test_airstrike_on_edge_fails() {
        let mut state = GameState::new(2);
        state.board.put(cache_slot(0, 0), airstrike_token(0));
        state.board.put(to_index(2, 2), unit(1, serde_json::json!({ "id": "a" })));
        state.board.put(to_index(1, 1), unit(1, serde_json::json!({ "id": "b" })));
        let before = state.clone();

        for edge in [to_index(1, 1), to_index(0, 4), to_index(2, 0), to_index(3, 7)] {
            let (result, _) = run(0, |ctx| use_instant_token(&mut state, ctx, cache_slot(0, 0), Some(edge)));
            assert_eq!(result, Err(crate::error::InvalidMove::HandlerRejected));
        }
        let (result, _) = run(0, |ctx| use_instant_token(&mut state, ctx, cache_slot(0, 0), None));
        assert!(result.is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_battle_requests_phase() {
        let mut state = GameState::new(2);
        state.board.put(
            cache_slot(1, 0),
            unit(1, serde_json::json!({ "id": "battle", "instant": true, "abilities": [ { "type": "battle" } ] })),
        );

        let (result, mut events) = run(1, |ctx| use_instant_token(&mut state, ctx, cache_slot(1, 0), None));
        result.unwrap();
        assert!(state.players[1].turn_ended);
        assert_eq!(events.pop_request(), Some(FlowRequest::EndPhase { next: Phase::Battle }));
    }

    #[test]
    fn test_battle_needs_valid_turn() {
        let mut state = GameState::new(2);
        state.board.put(
            cache_slot(1, 0),
            unit(1, serde_json::json!({ "id": "battle", "instant": true, "abilities": [ { "type": "battle" } ] })),
        );
        state.board.put(cache_slot(1, 1), unit(1, serde_json::json!({ "id": "x" })));
        state.board.put(cache_slot(1, 2), unit(1, serde_json::json!({ "id": "y" })));

        let (result, events) = run(1, |ctx| use_instant_token(&mut state, ctx, cache_slot(1, 0), None));
        assert!(result.is_err());
        assert!(!events.has_requests());
        assert!(!state.players[1].turn_ended);
        assert_eq!(state.board.cache_count(1), 3);
    }
}
