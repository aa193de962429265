use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use grabtris_engine::{GameConfig, GameSession, PieceSeed};
use rand::Rng as _;

use crate::util;

use self::{replay::ReplayArg, simulate::SimulateArg};

mod replay;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run a session with gravity only and print a summary
    Simulate(#[clap(flatten)] SimulateArg),
    /// Feed a recorded input script into a session and print a summary
    Replay(#[clap(flatten)] ReplayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
    }
    Ok(())
}

/// Options shared by every mode that starts a session.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SessionArg {
    /// Game configuration file (JSON format); missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece generation seed (32 hex digits); random when omitted
    #[arg(long)]
    seed: Option<PieceSeed>,
}

impl SessionArg {
    fn load_config(&self) -> anyhow::Result<Option<GameConfig>> {
        self.config
            .as_ref()
            .map(|path| util::read_json_file("config", path))
            .transpose()
    }
}

fn start_session(
    config: GameConfig,
    seed: Option<PieceSeed>,
) -> anyhow::Result<(GameSession, PieceSeed)> {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    eprintln!("Starting session with seed {seed}");
    let session = GameSession::with_seed(config, seed).context("Invalid game configuration")?;
    Ok((session, seed))
}
