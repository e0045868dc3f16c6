//! Import command implementation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tileloop::{Config, ImportOutcome, import_level, level_stats, parse_document};
use tracing::warn;

use super::common::{seeded_rng, write_output};
use super::render::{RenderOptions, nodes_to_svg};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Level JSON file
    pub file: PathBuf,

    /// Only print document stats; do not regenerate the tiling
    #[arg(long)]
    pub stats_only: bool,

    /// Seed used if the level has to be rebuilt from its rule
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print stats as JSON
    #[arg(long)]
    pub json: bool,

    /// Render the imported level to this SVG file
    #[arg(long)]
    pub svg: Option<PathBuf>,
}

/// Execute the import command.
pub fn cmd_import(args: &ImportArgs, config: Config) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let doc = parse_document(&text)
        .with_context(|| format!("invalid level file {}", args.file.display()))?;
    let stats = level_stats(&doc);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("═══════════════════════════════════════════════");
        println!("  LEVEL: {}", stats.name);
        println!("═══════════════════════════════════════════════");
        if !stats.description.is_empty() {
            println!("  {}", stats.description);
        }
        println!("  Tiling: {} ({})", stats.tiling_name, stats.rulestring);
        println!("  Tiles: {}", stats.tile_count);
        if let Some(created) = stats.created {
            println!("  Created: {}", created.to_rfc3339());
        }
        println!("  Connections: {}", stats.total_connections);
        for (weight, count) in &stats.connections_by_weight {
            println!("    weight {weight}: {count}");
        }
    }

    if args.stats_only {
        return Ok(());
    }

    let (mut rng, _) = seeded_rng(args.seed);
    let (level, outcome) = import_level(&doc, &config, &mut rng)
        .with_context(|| format!("cannot rebuild level from {}", args.file.display()))?;
    if outcome == ImportOutcome::Reconstructed {
        warn!("tile data did not match the regenerated tiling; level was rebuilt from its rule");
    }

    if !args.json {
        println!("  Import: {outcome:?}");
        println!("  Solved: {}", level.is_solved());
        println!("  Min moves to solve: {}", level.min_moves_to_solve());
        for (label, count) in level.tile_types() {
            println!("    {label}: {count}");
        }
        println!("═══════════════════════════════════════════════");
    }

    if let Some(path) = &args.svg {
        let opts = RenderOptions { scale: config.scale, ..Default::default() };
        let svg = nodes_to_svg(&level.tiling().render_nodes(&config.color), &opts);
        write_output(Some(path), &svg)?;
    }
    Ok(())
}
