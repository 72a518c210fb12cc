//! Move handlers
//!
//! Each handler validates completely before it mutates anything, so an
//! `Err(InvalidMove)` always leaves the state exactly as it was. The first
//! failing check decides the error.

use serde::{Deserialize, Serialize};

use crate::context::{Ctx, Phase};
use crate::coords::{cache_owner, is_board_pos, is_cache_slot, Pos, CACHE_SIZE, CELLS_SIZE};
use crate::error::InvalidMove;
use crate::instant;
use crate::state::GameState;

/// A player move as sent by a client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "camelCase")]
pub enum Move {
    MoveToken { from: Pos, to: Pos },
    RotateToken { pos: Pos, steps: i32 },
    DiscardCache { pos: Option<Pos> },
    UseInstantToken { at: Pos, on: Option<Pos> },
    EndTurn,
    BattlePreAction { at: Pos, on: Option<Pos> },
    BattlePostAction { at: Pos, on: Option<Pos> },
}

/// Move names, used by per-phase allow lists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveKind {
    MoveToken,
    RotateToken,
    DiscardCache,
    UseInstantToken,
    EndTurn,
    BattlePreAction,
    BattlePostAction,
}

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::MoveToken { .. } => MoveKind::MoveToken,
            Move::RotateToken { .. } => MoveKind::RotateToken,
            Move::DiscardCache { .. } => MoveKind::DiscardCache,
            Move::UseInstantToken { .. } => MoveKind::UseInstantToken,
            Move::EndTurn => MoveKind::EndTurn,
            Move::BattlePreAction { .. } => MoveKind::BattlePreAction,
            Move::BattlePostAction { .. } => MoveKind::BattlePostAction,
        }
    }
}

/// Relocate a piece between the player's cache and the board
pub fn move_token(state: &mut GameState, ctx: &Ctx, from: Pos, to: Pos) -> Result<(), InvalidMove> {
    let player = ctx.current_player;

    if to >= CELLS_SIZE || !(is_cache_slot(to) || is_board_pos(to)) {
        return Err(InvalidMove::InvalidCell);
    }
    if cache_owner(to).is_some_and(|owner| owner != player) {
        return Err(InvalidMove::ForeignCache);
    }
    let hex = state.board.get(from).ok_or(InvalidMove::EmptyCell)?;
    if hex.player != player {
        return Err(InvalidMove::NotOwner);
    }
    if hex.is_instant() {
        return Err(InvalidMove::InstantToken);
    }
    if !state.board.is_empty_at(to) {
        return Err(InvalidMove::Occupied);
    }
    if hex.turn_used.is_some_and(|t| t != ctx.turn) {
        return Err(InvalidMove::AlreadyCommitted);
    }

    let used = state.player(player).map_or(0, |p| p.tokens_used_in_turn);
    let commits = !hex.is_hq() && is_cache_slot(from) && !is_cache_slot(to);
    let returns = !hex.is_hq() && !is_cache_slot(from) && is_cache_slot(to);
    if commits && used >= CACHE_SIZE as u32 - 1 {
        return Err(InvalidMove::TurnLimitReached);
    }

    let Some(mut hex) = state.board.remove(from) else {
        return Err(InvalidMove::EmptyCell);
    };
    if let Some(record) = state.player_mut(player) {
        if commits {
            record.tokens_used_in_turn += 1;
            hex.turn_used = Some(ctx.turn);
        } else if returns {
            record.tokens_used_in_turn = record.tokens_used_in_turn.saturating_sub(1);
            hex.turn_used = None;
        }
    }
    state.board.put(to, hex);
    Ok(())
}

/// Turn a piece by `steps` sixths, in either direction
pub fn rotate_token(state: &mut GameState, ctx: &Ctx, pos: Pos, steps: i32) -> Result<(), InvalidMove> {
    let hex = state.board.get_mut(pos).ok_or(InvalidMove::EmptyCell)?;
    if hex.player != ctx.current_player {
        return Err(InvalidMove::NotOwner);
    }
    if hex.is_instant() {
        return Err(InvalidMove::InstantToken);
    }

    hex.rotation = (i32::from(hex.rotation) + steps.rem_euclid(6)).rem_euclid(6) as u8;
    Ok(())
}

/// Drop one cached token, or the whole cache when `pos` is `None`
pub fn discard_cache(state: &mut GameState, ctx: &Ctx, pos: Option<Pos>) -> Result<(), InvalidMove> {
    let player = ctx.current_player;

    let Some(pos) = pos else {
        for slot in crate::board::BoardState::cache_positions(player) {
            state.board.remove(slot);
        }
        return Ok(());
    };

    if !is_cache_slot(pos) {
        return Err(InvalidMove::NotCacheSlot);
    }
    if cache_owner(pos) != Some(player) {
        return Err(InvalidMove::NotOwner);
    }
    state.board.remove(pos);
    Ok(())
}

/// Resolve an instant token's single ability and consume the token
pub fn use_instant_token(
    state: &mut GameState,
    ctx: &mut Ctx,
    at: Pos,
    on: Option<Pos>,
) -> Result<(), InvalidMove> {
    let player = ctx.current_player;

    let used = state.player(player).map_or(0, |p| p.tokens_used_in_turn);
    if used >= CACHE_SIZE as u32 - 1 {
        return Err(InvalidMove::TurnLimitReached);
    }
    let hex = state.board.get(at).ok_or(InvalidMove::EmptyCell)?;
    if hex.player != player {
        return Err(InvalidMove::NotOwner);
    }
    let [ability] = hex.token.abilities.as_slice() else {
        return Err(InvalidMove::AbilityCount);
    };
    if !hex.is_instant() {
        return Err(InvalidMove::NotInstant);
    }
    let handler = instant::handler_for(ability.kind).ok_or(InvalidMove::NoHandler)?;

    if !handler(state, ctx, on) {
        return Err(InvalidMove::HandlerRejected);
    }

    if let Some(record) = state.player_mut(player) {
        record.tokens_used_in_turn += 1;
    }
    state.board.remove(at);
    Ok(())
}

/// Finish the turn, or decline a pending battle choice
pub fn end_turn(state: &mut GameState, ctx: &Ctx) -> Result<(), InvalidMove> {
    let player = ctx.current_player;
    if ctx.phase != Phase::Battle && !state.is_turn_valid(player) {
        return Err(InvalidMove::TurnIncomplete);
    }
    if let Some(record) = state.player_mut(player) {
        record.turn_ended = true;
    }
    Ok(())
}
