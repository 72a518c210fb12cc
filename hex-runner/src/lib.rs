//! Hex Runner - Scheduling and automated play
//!
//! This crate drives the rules engine:
//! - A reference turn/phase scheduler with a seeded RNG
//! - A random legal-move bot
//! - Single-match runs and parallel soak runs with invariant checks

mod bot;
mod config;
mod flow;
mod game_runner;
mod soak;

pub use bot::RandomBot;
pub use config::RunnerConfig;
pub use flow::{Flow, FlowError};
pub use game_runner::{play_game, MatchOutcome};
pub use soak::{check_invariants, soak, SoakReport, Violation};
