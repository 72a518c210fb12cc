//! Play command - one seeded match between random bots
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play(), report()
//! - Level 3: summarize()
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use hex_core::{GameState, PlayerId};
use hex_runner::{play_game, MatchOutcome, RunnerConfig};
use serde::Serialize;

use crate::GameArgs;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub game: GameArgs,

    /// Random seed shared by the match and the bots
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Maximum turns before the match is stopped
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Probability that a bot plays an instant when it can
    #[arg(long, default_value = "0.3")]
    pub instants: f64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Per-seat line of the summary
#[derive(Clone, Debug, Serialize)]
struct SeatSummary {
    player: PlayerId,
    army: String,
    units: usize,
    cached: usize,
    deck_left: usize,
    hq_damage: u32,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    seed: u64,
    turns: u32,
    battles: usize,
    moves: usize,
    exhausted: bool,
    seats: Vec<SeatSummary>,
    state: &'a GameState,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs) -> Result<()> {
    let outcome = play(&args)?;
    report(&outcome, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play(args: &PlayArgs) -> Result<MatchOutcome> {
    let game = args.game.load()?;
    let config = RunnerConfig::default()
        .with_seed(args.seed)
        .with_max_turns(args.max_turns)
        .with_instant_probability(args.instants);

    tracing::info!(
        "Starting match: {} players, seed {}",
        game.num_players(),
        args.seed
    );
    play_game(game, &config).with_context(|| format!("Match with seed {} failed", args.seed))
}

fn report(outcome: &MatchOutcome, json: bool) -> Result<()> {
    let seats = summarize(&outcome.final_state);

    if json {
        let report = JsonReport {
            seed: outcome.seed,
            turns: outcome.turns,
            battles: outcome.battles,
            moves: outcome.moves.len(),
            exhausted: outcome.exhausted(),
            seats,
            state: &outcome.final_state,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Seed:    {}", outcome.seed);
    println!("Turns:   {}", outcome.turns);
    println!("Moves:   {}", outcome.moves.len());
    println!("Battles: {}", outcome.battles);
    println!("Ended:   {}", if outcome.exhausted() { "tokens exhausted" } else { "turn limit" });
    println!();
    println!("{:<6} {:<10} {:>5} {:>6} {:>5} {:>9}", "Seat", "Army", "Units", "Cached", "Deck", "HQ damage");
    for seat in &seats {
        println!(
            "{:<6} {:<10} {:>5} {:>6} {:>5} {:>9}",
            seat.player, seat.army, seat.units, seat.cached, seat.deck_left, seat.hq_damage
        );
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn summarize(state: &GameState) -> Vec<SeatSummary> {
    (0..state.players.len())
        .map(|player| {
            let deck = state.players[player].deck.as_ref();
            let units = state
                .board
                .occupied()
                .filter(|(hex, _)| hex.player == player)
                .count();
            let hq_damage = state
                .board
                .occupied()
                .filter(|(hex, _)| hex.player == player && hex.is_hq())
                .map(|(hex, _)| hex.damage)
                .sum();

            SeatSummary {
                player,
                army: deck.map(|d| d.army.clone()).unwrap_or_default(),
                units,
                cached: state.board.cache_count(player),
                deck_left: deck.map_or(0, |d| d.remaining()),
                hq_damage,
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
