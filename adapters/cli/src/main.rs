#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays scripted matches with the lane defence
//! decision engine and inspects action frames.

mod scenario;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lane_defence_core::{ActionFrame, UnitCatalog};
use lane_defence_system_turn::StrategyConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

/// Lane defence decision engine.
#[derive(Parser, Debug)]
#[command(name = "lane-defence")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter, e.g. `debug` or `lane_defence_system_turn=debug`.
    /// Falls back to `RUST_LOG`, then `info`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a scripted match against the in-memory engine and print one JSON
    /// line per turn report.
    Simulate {
        /// Scenario TOML file.
        #[arg(long)]
        scenario: PathBuf,

        /// Strategy TOML file (default: reference strategy).
        #[arg(long)]
        strategy: Option<PathBuf>,

        /// Game-config JSON holding the `unitInformation` table.
        #[arg(long)]
        game_config: Option<PathBuf>,

        /// Turns to play (default: the scenario's `turns`).
        #[arg(long)]
        turns: Option<u32>,
    },

    /// Decode an action frame and print its breaches as JSON lines.
    DecodeFrame {
        /// File holding one frame in the engine's JSON format.
        frame: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    match args.command {
        Commands::Simulate {
            scenario,
            strategy,
            game_config,
            turns,
        } => simulate(&scenario, strategy.as_deref(), game_config.as_deref(), turns),
        Commands::DecodeFrame { frame } => decode_frame(&frame),
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn simulate(
    scenario_path: &Path,
    strategy_path: Option<&Path>,
    game_config_path: Option<&Path>,
    turns: Option<u32>,
) -> Result<()> {
    let scenario = Scenario::from_toml(&read(scenario_path)?)
        .with_context(|| format!("failed to load scenario {}", scenario_path.display()))?;
    let strategy = match strategy_path {
        Some(path) => StrategyConfig::load(path)?,
        None => StrategyConfig::default(),
    };
    let catalog = match game_config_path {
        Some(path) => UnitCatalog::from_game_config(&read(path)?)
            .with_context(|| format!("failed to load game config {}", path.display()))?,
        None => UnitCatalog::standard(),
    };
    let turns = turns.unwrap_or(scenario.turns);
    info!(turns, scenario = %scenario_path.display(), "simulating");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    scenario::simulate(&scenario, catalog, &strategy, turns, |report| {
        serde_json::to_writer(&mut out, report).context("failed to encode turn report")?;
        writeln!(out).context("failed to write turn report")
    })
}

fn decode_frame(path: &Path) -> Result<()> {
    let frame = ActionFrame::decode(&read(path)?)
        .with_context(|| format!("failed to decode frame {}", path.display()))?;
    info!(
        turn = frame.turn,
        frame = frame.frame,
        breaches = frame.breaches.len(),
        "frame decoded"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for breach in &frame.breaches {
        let line = serde_json::json!({
            "turn": breach.turn,
            "frame": breach.frame,
            "cell": breach.cell,
            "owner": breach.owner,
        });
        writeln!(out, "{line}").context("failed to write breach")?;
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
