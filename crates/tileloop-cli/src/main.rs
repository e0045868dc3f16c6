//! tileloop CLI: generate tilings, build puzzle levels, inspect level files.
//!
//! ## Rust Lesson #25: Derive-based argument parsing
//!
//! Every subcommand is a struct of plain fields with `#[derive(Args)]`.
//! clap turns field names into flags and doc comments into help text, so
//! the type *is* the usage string. Shared flags live in one struct that
//! each command pulls in with `#[command(flatten)]`.

mod cli;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::{BenchmarkArgs, GenerateArgs, ImportArgs, LevelArgs, RulesArgs};

#[derive(Debug, Parser)]
#[command(name = "tileloop", version, about = "Polygon tilings and connector-loop puzzles")]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML file with generation and puzzle settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a tiling and write it as SVG, PNG or JSON
    Generate(GenerateArgs),
    /// Build a scrambled puzzle level and export it as JSON
    Level(LevelArgs),
    /// Load a level file, print its stats and optionally render it
    Import(ImportArgs),
    /// List the named tilings
    Rules(RulesArgs),
    /// Time repeated generation of one rule
    Benchmark(BenchmarkArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Generate(args) => cli::cmd_generate(&args, config),
        Command::Level(args) => cli::cmd_level(&args, config),
        Command::Import(args) => cli::cmd_import(&args, config),
        Command::Rules(args) => cli::cmd_rules(&args),
        Command::Benchmark(args) => cli::cmd_benchmark(&args, config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
