//! Phase and turn state machine
//!
//! [`HexGame`] holds the match rules and exposes the lifecycle hooks the
//! scheduler calls. Hooks never drive the scheduler directly; they queue
//! [`FlowRequest`](crate::context::FlowRequest)s on the context.

use crate::army::ArmyBook;
use crate::battle::{battle_post_action, battle_pre_action, Battle, BattleStage};
use crate::config::GameConfig;
use crate::context::{Ctx, Phase, TraceEvent};
use crate::coords::{cache_slot, PlayerId, CACHE_SIZE};
use crate::deck::Deck;
use crate::error::{CoreError, InvalidMove};
use crate::hex::Hex;
use crate::moves::{self, Move};
use crate::state::GameState;

// ============================================================================
// TURN ORDER
// ============================================================================

/// Turn order policy of a phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOrder {
    Once,    // Every seat once, in seat order, then the phase ends
    Default, // Round robin
    Battle,  // Whoever is at the front of the battle queue
}

impl TurnOrder {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::HqSetup => TurnOrder::Once,
            Phase::Normal => TurnOrder::Default,
            Phase::Battle => TurnOrder::Battle,
        }
    }

    /// Player holding the first turn of the phase, if any
    pub fn first(self, state: &GameState, current: PlayerId) -> Option<PlayerId> {
        match self {
            TurnOrder::Once => Some(0),
            TurnOrder::Default => Some(current),
            TurnOrder::Battle => state.battle_turns.first().copied(),
        }
    }

    /// Player after `current`, or `None` when the phase has run out of turns
    pub fn next(self, state: &GameState, current: PlayerId, num_players: usize) -> Option<PlayerId> {
        match self {
            TurnOrder::Once => (current + 1 < num_players).then_some(current + 1),
            TurnOrder::Default => Some((current + 1) % num_players),
            TurnOrder::Battle => state.battle_turns.first().copied(),
        }
    }
}

// ============================================================================
// GAME RULES
// ============================================================================

/// Rules of one match: seating, armies and the lifecycle hooks
#[derive(Clone, Debug)]
pub struct HexGame {
    config: GameConfig,
    armies: ArmyBook,
}

impl HexGame {
    /// Create a game, checking that every seat has a known army
    pub fn new(config: GameConfig, armies: ArmyBook) -> Result<Self, CoreError> {
        config.validate()?;
        for id in config.armies.iter().take(config.num_players) {
            if armies.get(id).is_none() {
                return Err(CoreError::UnknownArmy(id.clone()));
            }
        }
        Ok(Self { config, armies })
    }

    /// Two players with the built-in armies
    pub fn standard() -> anyhow::Result<Self> {
        Ok(Self::new(GameConfig::default(), ArmyBook::builtin()?)?)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn armies(&self) -> &ArmyBook {
        &self.armies
    }

    pub fn num_players(&self) -> usize {
        self.config.num_players
    }

    /// Fresh state for a new match
    pub fn setup(&self) -> GameState {
        GameState::new(self.config.num_players)
    }

    /// Scheduler predicate: should the current turn end now
    pub fn end_turn_if(&self, state: &GameState, player: PlayerId) -> bool {
        state.player(player).is_some_and(|p| p.turn_ended)
    }

    // ------------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------------

    /// Validate and apply a move for the context's current player
    pub fn process_move(&self, state: &mut GameState, ctx: &mut Ctx, mv: Move) -> Result<(), InvalidMove> {
        if !ctx.phase.allows(mv.kind()) {
            return Err(InvalidMove::NotAllowed(ctx.phase));
        }

        let result = match mv {
            Move::MoveToken { from, to } => moves::move_token(state, ctx, from, to),
            Move::RotateToken { pos, steps } => moves::rotate_token(state, ctx, pos, steps),
            Move::DiscardCache { pos } => moves::discard_cache(state, ctx, pos),
            Move::UseInstantToken { at, on } => moves::use_instant_token(state, ctx, at, on),
            Move::EndTurn => moves::end_turn(state, ctx),
            Move::BattlePreAction { at, on } => battle_pre_action(state, ctx, at, on),
            Move::BattlePostAction { at, on } => battle_post_action(state, ctx, at, on),
        };

        if let Err(err) = &result {
            tracing::trace!(player = ctx.current_player, ?mv, %err, "Rejected move");
        }
        result
    }

    // ------------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------------

    pub fn on_phase_begin(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        ctx.trace(TraceEvent::PhaseBegin(ctx.phase));

        match ctx.phase {
            Phase::HqSetup => Ok(()),
            Phase::Normal => {
                // The scheduler opens a turn for the current seat on phase
                // entry; skip it so play moves on to the next seat.
                ctx.end_turn(None);
                Ok(())
            }
            Phase::Battle => {
                let initiator = ctx.current_player;
                let battle = Battle::start(&mut state.board, initiator);
                ctx.trace(TraceEvent::BattleStarted {
                    initiative: battle.initiative,
                    initiator,
                });
                tracing::debug!(initiator, initiative = battle.initiative, "Battle started");

                state.battle = Some(battle);
                state.battle_turns.clear();
                self.advance_battle(state, ctx)
            }
        }
    }

    pub fn on_phase_end(&self, _state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        ctx.trace(TraceEvent::PhaseEnd(ctx.phase));
        Ok(())
    }

    pub fn on_turn_begin(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        ctx.trace(TraceEvent::TurnBegin {
            player: ctx.current_player,
            turn: ctx.turn,
        });

        match ctx.phase {
            Phase::HqSetup => self.deal_headquarters(state, ctx),
            Phase::Normal => self.refill_cache(state, ctx),
            Phase::Battle => Ok(()),
        }
    }

    pub fn on_turn_end(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        let player = ctx.current_player;
        let record = state.player_mut(player).ok_or(CoreError::UnknownPlayer(player))?;
        record.turn_ended = false;
        record.tokens_used_in_turn = 0;
        ctx.trace(TraceEvent::TurnEnd { player, turn: ctx.turn });

        match ctx.phase {
            Phase::HqSetup => Ok(()),
            Phase::Normal => {
                if state.board.is_full() {
                    tracing::debug!(player, "Board full, battle requested");
                    ctx.end_phase(Phase::Battle);
                }
                Ok(())
            }
            Phase::Battle => {
                state.battle_turns.retain(|&p| p != player);
                if state.battle_turns.is_empty() {
                    self.advance_battle(state, ctx)
                } else {
                    Ok(())
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Hook internals
    // ------------------------------------------------------------------------

    /// Create the player's deck on first use and put its headquarters in the cache
    fn deal_headquarters(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        let player = ctx.current_player;
        let GameState { board, players, .. } = state;
        let record = players.get_mut(player).ok_or(CoreError::UnknownPlayer(player))?;

        if record.deck.is_none() {
            let id = self.config.armies.get(player).ok_or(CoreError::NoArmyAssigned(player))?;
            let army = self.armies.get(id).ok_or_else(|| CoreError::UnknownArmy(id.clone()))?;
            record.deck = Some(Deck::new(army, self.config.hq_health));
        }
        let deck = record.deck.as_mut().ok_or(CoreError::MissingDeck(player))?;

        for slot in 0..CACHE_SIZE {
            let pos = cache_slot(player, slot);
            if !board.is_empty_at(pos) {
                continue;
            }
            let Some(token) = deck.draw_hq() else {
                break;
            };
            board.put(pos, Hex::new(player, deck.army.clone(), token));
        }
        Ok(())
    }

    /// Fill every empty cache slot from the deck
    fn refill_cache(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        let player = ctx.current_player;
        let GameState { board, players, .. } = state;
        let deck = players
            .get_mut(player)
            .and_then(|p| p.deck.as_mut())
            .ok_or(CoreError::MissingDeck(player))?;

        for slot in 0..CACHE_SIZE {
            let pos = cache_slot(player, slot);
            if !board.is_empty_at(pos) {
                continue;
            }
            let Some(token) = deck.draw(&mut *ctx.random) else {
                break;
            };
            board.put(pos, Hex::new(player, deck.army.clone(), token));
        }
        Ok(())
    }

    /// Run the battle until it needs a player's choice or is over
    fn advance_battle(&self, state: &mut GameState, ctx: &mut Ctx) -> Result<(), CoreError> {
        let num_players = ctx.num_players;
        let GameState {
            battle: slot,
            battle_turns,
            board,
            ..
        } = state;

        loop {
            let battle = slot.as_mut().ok_or(CoreError::NoBattle)?;
            match battle.stage {
                BattleStage::Prepare => {
                    if !battle.prepare_segment(board) {
                        break;
                    }
                    ctx.trace(TraceEvent::SegmentPrepared {
                        initiative: battle.initiative,
                        units: battle.segment_units(),
                    });

                    let players = battle.players_with_pre_actions(board, num_players);
                    if !players.is_empty() {
                        let first = players[0];
                        *battle_turns = players;
                        ctx.end_turn(Some(first));
                        return Ok(());
                    }
                }
                BattleStage::PreActions => {
                    battle.run_segment(board);

                    let players = battle.players_with_post_actions(board, num_players);
                    if !players.is_empty() {
                        let first = players[0];
                        *battle_turns = players;
                        ctx.end_turn(Some(first));
                        return Ok(());
                    }
                }
                BattleStage::PostActions => {
                    let initiative = battle.initiative;
                    let removed = battle.finish_segment(board);
                    tracing::debug!(initiative, removed = removed.len(), "Segment finished");
                    ctx.trace(TraceEvent::SegmentFinished { initiative, removed });
                }
            }
        }

        let initiator = slot.take().map(|b| b.initiator).ok_or(CoreError::NoBattle)?;
        battle_turns.clear();
        ctx.trace(TraceEvent::BattleEnded { initiator });
        tracing::debug!(initiator, "Battle ended");

        ctx.end_turn(Some(initiator));
        ctx.end_phase(Phase::Normal);
        Ok(())
    }
}
