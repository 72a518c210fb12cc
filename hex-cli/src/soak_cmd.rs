//! Soak command - many seeded matches in parallel

use anyhow::{bail, Result};
use clap::Args;
use hex_runner::{soak, RunnerConfig};

use crate::GameArgs;

#[derive(Args)]
pub struct SoakArgs {
    #[command(flatten)]
    pub game: GameArgs,

    /// Number of matches to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Seed of the first match; the others count up from it
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Maximum turns per match
    #[arg(long, default_value = "200")]
    pub max_turns: u32,
}

/// Run soak command, failing if any match broke an invariant
pub fn run(args: SoakArgs) -> Result<()> {
    let game = args.game.load()?;
    let config = RunnerConfig::default()
        .with_seed(args.seed)
        .with_max_turns(args.max_turns);

    tracing::info!("Soaking {} matches from seed {}", args.games, args.seed);
    let report = soak(&game, &config, args.games);

    println!("Completed: {}/{}", report.completed, args.games);
    println!("Battles:   {}", report.battles);
    println!("Avg moves: {:.1}", report.avg_moves);

    if !report.is_clean() {
        for (seed, error) in &report.failures {
            eprintln!("seed {seed}: {error}");
        }
        bail!("{} of {} matches failed", report.failures.len(), args.games);
    }
    Ok(())
}
