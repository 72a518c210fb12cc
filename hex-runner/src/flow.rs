//! Reference turn/phase scheduler
//!
//! [`Flow`] plays the part of the external framework: it owns the state, the
//! seeded RNG and the turn pointer, calls the lifecycle hooks, and drains the
//! requests the core queues on its context.

use hex_core::{
    CoreError, Ctx, Events, FlowRequest, GameState, HexGame, InvalidMove, Move, Phase, PlayerId,
    TraceEvent, TurnOrder,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Upper bound on scheduler steps for one settle pass
const MAX_SETTLE_STEPS: usize = 256;

type Hook = fn(&HexGame, &mut GameState, &mut Ctx) -> Result<(), CoreError>;

/// Scheduler failure
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("player {player} moved out of turn (player {current} holds it)")]
    NotYourTurn { player: PlayerId, current: PlayerId },
    #[error("invalid move: {0}")]
    Invalid(#[from] InvalidMove),
    #[error("engine error: {0}")]
    Core(#[from] CoreError),
    #[error("scheduler did not settle within {0} steps")]
    Stalled(usize),
}

/// Authoritative match driver
#[derive(Clone, Debug)]
pub struct Flow {
    game: HexGame,
    state: GameState,
    phase: Phase,
    current: PlayerId,
    turn: u32,
    turn_active: bool,
    rng: ChaCha8Rng,
    events: Events,
}

impl Flow {
    /// Start a new match in the headquarters phase
    pub fn new(game: HexGame, seed: u64) -> Result<Self, FlowError> {
        let state = game.setup();
        let mut flow = Self::from_parts(game, state, Phase::HqSetup, 0, seed);
        flow.run_hook(HexGame::on_phase_begin)?;
        flow.settle()?;
        Ok(flow)
    }

    /// Pick up a match from a snapshot, opening a turn for `current`
    pub fn resume(
        game: HexGame,
        state: GameState,
        phase: Phase,
        current: PlayerId,
        seed: u64,
    ) -> Result<Self, FlowError> {
        let mut flow = Self::from_parts(game, state, phase, current, seed);
        flow.settle()?;
        Ok(flow)
    }

    fn from_parts(game: HexGame, state: GameState, phase: Phase, current: PlayerId, seed: u64) -> Self {
        Self {
            game,
            state,
            phase,
            current,
            turn: 0,
            turn_active: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Events::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn game(&self) -> &HexGame {
        &self.game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Every transition recorded so far
    pub fn trace(&self) -> &[TraceEvent] {
        &self.events.trace
    }

    fn order(&self) -> TurnOrder {
        TurnOrder::for_phase(self.phase)
    }

    // ------------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------------

    /// Apply a move for `player`, then let the scheduler settle
    pub fn make_move(&mut self, player: PlayerId, mv: Move) -> Result<(), FlowError> {
        if !self.turn_active || player != self.current {
            return Err(FlowError::NotYourTurn {
                player,
                current: self.current,
            });
        }

        let mut ctx = Ctx {
            current_player: self.current,
            num_players: self.game.num_players(),
            turn: self.turn,
            phase: self.phase,
            random: &mut self.rng,
            events: &mut self.events,
        };
        self.game.process_move(&mut self.state, &mut ctx, mv)?;
        tracing::trace!(player, ?mv, "Move applied");

        self.settle()
    }

    /// Whether `mv` would be accepted right now, without touching the match
    pub fn try_move(&self, player: PlayerId, mv: Move) -> bool {
        if !self.turn_active || player != self.current {
            return false;
        }

        let mut state = self.state.clone();
        let mut rng = self.rng.clone();
        let mut events = Events::new();
        let mut ctx = Ctx {
            current_player: self.current,
            num_players: self.game.num_players(),
            turn: self.turn,
            phase: self.phase,
            random: &mut rng,
            events: &mut events,
        };
        self.game.process_move(&mut state, &mut ctx, mv).is_ok()
    }

    // ------------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------------

    fn run_hook(&mut self, hook: Hook) -> Result<(), CoreError> {
        let mut ctx = Ctx {
            current_player: self.current,
            num_players: self.game.num_players(),
            turn: self.turn,
            phase: self.phase,
            random: &mut self.rng,
            events: &mut self.events,
        };
        hook(&self.game, &mut self.state, &mut ctx)
    }

    /// Drain requests and open or close turns until a player must act
    fn settle(&mut self) -> Result<(), FlowError> {
        for _ in 0..MAX_SETTLE_STEPS {
            if let Some(request) = self.events.pop_request() {
                match request {
                    FlowRequest::EndPhase { next } => self.change_phase(next)?,
                    FlowRequest::EndTurn { next } if self.turn_active => self.finish_turn(next)?,
                    FlowRequest::EndTurn { next } => {
                        // No open turn: only the pointer moves
                        let num_players = self.game.num_players();
                        self.current = next
                            .or_else(|| self.order().next(&self.state, self.current, num_players))
                            .unwrap_or(self.current);
                    }
                }
                continue;
            }

            if !self.turn_active {
                self.begin_turn()?;
                continue;
            }
            if self.game.end_turn_if(&self.state, self.current) {
                self.finish_turn(None)?;
                continue;
            }
            return Ok(());
        }
        Err(FlowError::Stalled(MAX_SETTLE_STEPS))
    }

    fn begin_turn(&mut self) -> Result<(), FlowError> {
        self.turn += 1;
        self.turn_active = true;
        tracing::debug!(player = self.current, turn = self.turn, phase = ?self.phase, "Turn begins");
        self.run_hook(HexGame::on_turn_begin)?;
        Ok(())
    }

    fn finish_turn(&mut self, next: Option<PlayerId>) -> Result<(), FlowError> {
        self.turn_active = false;
        self.run_hook(HexGame::on_turn_end)?;

        // The hooks asked for something; those requests decide what follows
        if self.events.has_requests() {
            return Ok(());
        }

        let num_players = self.game.num_players();
        match next.or_else(|| self.order().next(&self.state, self.current, num_players)) {
            Some(player) => self.current = player,
            None => self.change_phase(self.phase.default_next())?,
        }
        Ok(())
    }

    fn change_phase(&mut self, next: Phase) -> Result<(), FlowError> {
        if self.turn_active {
            self.turn_active = false;
            self.run_hook(HexGame::on_turn_end)?;
            // The change under way wins over phase requests from the closing turn
            self.events
                .requests
                .retain(|r| !matches!(r, FlowRequest::EndPhase { .. }));
        }

        self.run_hook(HexGame::on_phase_end)?;
        tracing::info!(from = ?self.phase, to = ?next, "Phase change");
        self.phase = next;
        if let Some(first) = self.order().first(&self.state, self.current) {
            self.current = first;
        }
        self.run_hook(HexGame::on_phase_begin)?;
        Ok(())
    }
}
