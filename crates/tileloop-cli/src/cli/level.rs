//! Level command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tileloop::{Config, Dimensions, Level, TilingGenerator, export_level};
use tracing::info;

use super::common::{GenerationArgs, resolve_rule, seeded_rng, write_output};
use super::render::{RenderOptions, canvas_size, nodes_to_svg, write_png};

#[derive(Debug, Args)]
pub struct LevelArgs {
    /// Rule string or catalog name
    pub rule: String,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Build the level on the dual tiling
    #[arg(long)]
    pub dual: bool,

    /// RNG seed for weights, effects and the shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of linked-tile effects to try to attach
    #[arg(long, default_value_t = 0)]
    pub effects: usize,

    /// Level name stored in the metadata
    #[arg(long, default_value = "")]
    pub name: String,

    /// Level description stored in the metadata
    #[arg(long, default_value = "")]
    pub description: String,

    /// Output file for the level JSON (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a preview drawing of the scrambled level
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Write a PNG preview of the scrambled level
    #[arg(long)]
    pub png: Option<PathBuf>,
}

/// Execute the level command.
pub fn cmd_level(args: &LevelArgs, mut config: Config) -> Result<()> {
    args.generation.apply(&mut config);
    let rule = resolve_rule(&args.rule, args.dual);
    let (mut rng, seed) = seeded_rng(args.seed);

    let tiling = TilingGenerator::new(config.clone())
        .generate(&rule)
        .with_context(|| format!("cannot generate `{rule}`"))?;
    let level = Level::build(tiling, &config, args.effects, &mut rng);
    info!(
        seed,
        tiles = level.len(),
        effects = level.effects().len(),
        min_moves = level.min_moves_to_solve(),
        "level ready"
    );

    let nodes = level.tiling().render_nodes(&config.color);
    let opts = RenderOptions { scale: config.scale, ..Default::default() };
    let (width, height) = canvas_size(&nodes, &opts);

    let doc = export_level(&level, &args.name, &args.description, Dimensions { width, height });
    let json = serde_json::to_string_pretty(&doc)?;
    write_output(args.output.as_deref(), &format!("{json}\n"))?;

    if args.svg.is_some() || args.png.is_some() {
        let svg = nodes_to_svg(&nodes, &opts);
        if let Some(path) = &args.svg {
            write_output(Some(path), &svg)?;
        }
        if let Some(path) = &args.png {
            write_png(&svg, path)?;
        }
    }
    Ok(())
}
