//! Hex CLI - Command-line interface
//!
//! Commands:
//! - play: Play one seeded bot match
//! - soak: Play many seeded matches in parallel and check invariants
//! - army: Load, validate and print army definitions

mod army_cmd;
mod play_cmd;
mod soak_cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hex_core::{ArmyBook, GameConfig, HexGame};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hex")]
#[command(about = "Hex tactical board game engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single seeded match between random bots
    Play(play_cmd::PlayArgs),
    /// Play many matches in parallel
    Soak(soak_cmd::SoakArgs),
    /// Validate and print army definitions
    Army(army_cmd::ArmyArgs),
}

/// Options shared by the commands that set up a match
#[derive(Args, Clone, Debug, Default)]
pub struct GameArgs {
    /// Match config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of army JSON files replacing the built-in armies
    #[arg(long, value_name = "DIR")]
    pub armies: Option<PathBuf>,
}

impl GameArgs {
    /// Build the match rules from the config and army sources
    pub fn load(&self) -> Result<HexGame> {
        let config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        let armies = load_armies(self.armies.as_deref())?;
        HexGame::new(config, armies).context("Invalid match setup")
    }
}

/// Army book from a directory, or the built-in one
pub fn load_armies(dir: Option<&std::path::Path>) -> Result<ArmyBook> {
    match dir {
        Some(dir) => ArmyBook::load_dir(dir),
        None => ArmyBook::builtin().context("Built-in armies are invalid"),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args),
        Commands::Soak(args) => soak_cmd::run(args),
        Commands::Army(args) => army_cmd::run(args),
    }
}
