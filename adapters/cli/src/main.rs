#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Margolus simulator.

mod batch;
mod config;
mod pattern_transfer;
mod play;

use std::{
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use margolus_core::{CellCoord, Pacing};
use margolus_system_scheduler::Session;
use margolus_world::Automaton;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    batch::BatchArgs,
    config::{resolve_rule, Config},
    pattern_transfer::PatternSnapshot,
    play::PlayArgs,
};

/// Reversible block cellular automata on a torus.
#[derive(Debug, Parser)]
#[command(name = "margolus", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Step a pattern read from stdin between two frames
    Batch(BatchArgs),
    /// Play a pattern in real time
    Play(PlayArgs),
    /// List the available rules with their hex tables
    Rules {
        /// TOML file contributing custom rules.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Convert between cell lists and pattern transfer strings
    #[command(subcommand)]
    Pattern(PatternCommand),
}

#[derive(Debug, Subcommand)]
enum PatternCommand {
    /// Read `[[row, column], ...]` from stdin and print a transfer string
    Encode(EncodeArgs),
    /// Print the grid, rule and cells held by a transfer string
    Decode {
        /// Transfer string starting with `margolus:v1:`.
        value: String,
    },
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Number of grid rows (positive, even).
    #[arg(long)]
    rows: u32,
    /// Number of grid columns (positive, even).
    #[arg(long)]
    columns: u32,
    /// Built-in rule name or hex transition table.
    #[arg(long, default_value = "critters")]
    rule: String,
}

/// Entry point for the Margolus command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match Cli::parse().command {
        Commands::Batch(args) => {
            let input = read_stdin()?;
            let mut stdout = io::stdout().lock();
            batch::run(&args, &input, &mut stdout)
        }
        Commands::Play(args) => play::run(&args),
        Commands::Rules { config } => list_rules(config),
        Commands::Pattern(PatternCommand::Encode(args)) => encode_pattern(&args),
        Commands::Pattern(PatternCommand::Decode { value }) => decode_pattern(&value),
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    let _ = io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn list_rules(config: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let automaton = Automaton::new(2, 2).context("minimal grid")?;
    let mut session = Session::new(automaton, Pacing::default());
    config.register_rules(&mut session)?;

    let mut stdout = io::stdout().lock();
    for rule in session.rules() {
        writeln!(stdout, "{}\t{}", rule.name(), rule.table().to_hex())?;
    }
    Ok(())
}

fn encode_pattern(args: &EncodeArgs) -> Result<()> {
    let automaton = Automaton::new(args.rows, args.columns)
        .with_context(|| format!("bad grid size {}x{}", args.rows, args.columns))?;
    let mut session = Session::new(automaton, Pacing::default());
    let rule = resolve_rule(&mut session, &args.rule)?;

    let cells: Vec<CellCoord> =
        serde_json::from_str(&read_stdin()?).context("failed to parse input cells as JSON")?;
    let snapshot = PatternSnapshot {
        rows: args.rows,
        columns: args.columns,
        rule: rule.table().to_hex(),
        cells,
    };
    let _ = snapshot
        .to_automaton()
        .context("cells do not fit the grid")?;
    println!("{}", snapshot.encode());
    Ok(())
}

fn decode_pattern(value: &str) -> Result<()> {
    let snapshot = PatternSnapshot::decode(value).context("failed to decode pattern")?;
    let automaton = snapshot.to_automaton().context("pattern does not fit its grid")?;
    let normalised = PatternSnapshot::capture(&automaton);
    let json = serde_json::to_string_pretty(&normalised).context("failed to serialise pattern")?;
    println!("{json}");
    Ok(())
}
