//! Typed handler context
//!
//! Every move handler and lifecycle hook receives a [`Ctx`]: who is acting,
//! which turn and phase it is, the shared random source, and an outward queue
//! of requests for the scheduler. The core never calls the scheduler directly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::coords::{PlayerId, Pos};
use crate::deck::RandomSource;
use crate::moves::MoveKind;

/// Game phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    HqSetup, // Each player places headquarters once
    Normal,  // Main play, round robin
    Battle,  // Initiative-driven combat resolution
}

impl Phase {
    /// Moves accepted by this phase
    pub fn allowed_moves(self) -> &'static [MoveKind] {
        match self {
            Phase::HqSetup => &[MoveKind::EndTurn, MoveKind::MoveToken, MoveKind::RotateToken],
            Phase::Normal => &[
                MoveKind::MoveToken,
                MoveKind::RotateToken,
                MoveKind::DiscardCache,
                MoveKind::UseInstantToken,
                MoveKind::EndTurn,
            ],
            Phase::Battle => &[
                MoveKind::BattlePreAction,
                MoveKind::BattlePostAction,
                MoveKind::EndTurn,
            ],
        }
    }

    pub fn allows(self, kind: MoveKind) -> bool {
        self.allowed_moves().contains(&kind)
    }

    /// Phase entered when this one runs out of turns on its own
    pub fn default_next(self) -> Phase {
        match self {
            Phase::HqSetup | Phase::Battle => Phase::Normal,
            Phase::Normal => Phase::Normal,
        }
    }
}

/// Request from the core to the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowRequest {
    /// End the current turn, optionally naming who plays next
    EndTurn { next: Option<PlayerId> },
    /// End the current phase and enter `next`
    EndPhase { next: Phase },
}

/// Structured record of a state machine transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEvent {
    PhaseBegin(Phase),
    PhaseEnd(Phase),
    TurnBegin { player: PlayerId, turn: u32 },
    TurnEnd { player: PlayerId, turn: u32 },
    BattleStarted { initiative: i32, initiator: PlayerId },
    SegmentPrepared { initiative: i32, units: Vec<Pos> },
    SegmentFinished { initiative: i32, removed: Vec<Pos> },
    BattleEnded { initiator: PlayerId },
}

/// Outward event sink owned by the scheduler
#[derive(Clone, Debug, Default)]
pub struct Events {
    pub requests: VecDeque<FlowRequest>,
    pub trace: Vec<TraceEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop_request(&mut self) -> Option<FlowRequest> {
        self.requests.pop_front()
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Context passed by reference into every handler and hook
pub struct Ctx<'a> {
    pub current_player: PlayerId,
    pub num_players: usize,
    pub turn: u32,
    pub phase: Phase,
    pub random: &'a mut dyn RandomSource,
    pub events: &'a mut Events,
}

impl<'a> Ctx<'a> {
    /// Ask the scheduler to end the current turn
    pub fn end_turn(&mut self, next: Option<PlayerId>) {
        self.events.requests.push_back(FlowRequest::EndTurn { next });
    }

    /// Ask the scheduler to switch phases
    pub fn end_phase(&mut self, next: Phase) {
        self.events.requests.push_back(FlowRequest::EndPhase { next });
    }

    /// Record a transition and log it
    pub fn trace(&mut self, event: TraceEvent) {
        tracing::debug!(?event, phase = ?self.phase, player = self.current_player, "transition");
        self.events.trace.push(event);
    }
}
