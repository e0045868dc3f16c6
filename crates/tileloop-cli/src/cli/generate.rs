//! Generate command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use tileloop::{Config, GenerationStats, RenderNode, Tiling, TilingGenerator};
use tracing::{info, warn};

use super::common::{GenerationArgs, resolve_rule, seeded_rng, write_output};
use super::render::{RenderOptions, nodes_to_svg, write_png};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Rule string such as "6-3-3/r60/r(h5)", or a name from `tileloop rules`
    #[arg(required_unless_present = "grow")]
    pub rule: Option<String>,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Build the dual tiling
    #[arg(long)]
    pub dual: bool,

    /// Grow a random tiling from vertex configurations instead of a rule
    #[arg(long, conflicts_with = "rule")]
    pub grow: bool,

    /// Seed for --grow
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print nodes and stats as JSON instead of SVG
    #[arg(long)]
    pub json: bool,

    /// Omit connector pipes from the drawing
    #[arg(long)]
    pub no_connectors: bool,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also rasterize the drawing to this PNG file
    #[arg(long)]
    pub png: Option<PathBuf>,
}

#[derive(Serialize)]
struct NodeDump {
    #[serde(flatten)]
    node: RenderNode,
    neighbors: Vec<usize>,
}

#[derive(Serialize)]
struct TilingDump<'a> {
    rule: String,
    dual: bool,
    islamic: bool,
    stats: &'a GenerationStats,
    nodes: Vec<NodeDump>,
}

fn dump<'a>(tiling: &'a Tiling, config: &Config) -> TilingDump<'a> {
    let nodes = tiling
        .render_nodes(&config.color)
        .into_iter()
        .zip(&tiling.nodes)
        .map(|(node, polygon)| NodeDump { node, neighbors: polygon.neighbors.clone() })
        .collect();
    TilingDump {
        rule: tiling.rule_string(),
        dual: tiling.is_dual,
        islamic: tiling.rule.as_ref().is_some_and(|r| r.islamic),
        stats: &tiling.stats,
        nodes,
    }
}

/// Execute the generate command.
pub fn cmd_generate(args: &GenerateArgs, mut config: Config) -> Result<()> {
    args.generation.apply(&mut config);
    let generator = TilingGenerator::new(config.clone());

    let tiling = if args.grow {
        let (mut rng, _) = seeded_rng(args.seed);
        generator.grow_random(&mut rng)
    } else {
        let Some(input) = args.rule.as_deref() else {
            bail!("a rule string or --grow is required");
        };
        let rule = resolve_rule(input, args.dual);
        generator.generate(&rule).with_context(|| format!("cannot generate `{rule}`"))?
    };

    if tiling.is_empty() {
        warn!("tiling has no nodes");
    }
    info!(
        nodes = tiling.len(),
        layers = tiling.stats.layers_completed,
        stop = ?tiling.stats.stop_reason,
        "generated"
    );

    let opts = RenderOptions {
        scale: config.scale,
        connectors: !args.no_connectors,
        islamic: tiling.rule.as_ref().is_some_and(|r| r.islamic),
        ..Default::default()
    };
    let svg = nodes_to_svg(&tiling.render_nodes(&config.color), &opts);

    if args.json {
        let json = serde_json::to_string_pretty(&dump(&tiling, &config))?;
        write_output(args.output.as_deref(), &format!("{json}\n"))?;
    } else {
        write_output(args.output.as_deref(), &svg)?;
    }
    if let Some(png) = &args.png {
        write_png(&svg, png)?;
    }
    Ok(())
}
