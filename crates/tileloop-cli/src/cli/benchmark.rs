//! Benchmark command implementation.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use tileloop::{Config, TilingGenerator, parse_rule};

use super::common::{GenerationArgs, resolve_rule};

#[derive(Debug, Args)]
pub struct BenchmarkArgs {
    /// Rule string or catalog name
    pub rule: String,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Benchmark the dual tiling
    #[arg(long)]
    pub dual: bool,

    /// Timed runs
    #[arg(long, default_value_t = 10)]
    pub runs: u32,
}

/// Execute the benchmark command.
pub fn cmd_benchmark(args: &BenchmarkArgs, mut config: Config) -> Result<()> {
    args.generation.apply(&mut config);
    let rule = resolve_rule(&args.rule, args.dual);
    let parsed = parse_rule(&rule).with_context(|| format!("cannot parse `{rule}`"))?;
    let generator = TilingGenerator::new(config);
    let runs = args.runs.max(1);

    println!("Generating '{rule}' {runs} times...");
    let mut total = Duration::ZERO;
    let mut fastest = Duration::MAX;
    let mut last = None;
    for _ in 0..runs {
        let start = Instant::now();
        let tiling = generator.generate_parsed(parsed.clone())?;
        let elapsed = start.elapsed();
        total += elapsed;
        fastest = fastest.min(elapsed);
        last = Some(tiling);
    }
    let Some(tiling) = last else {
        return Ok(());
    };

    let avg_ms = total.as_secs_f64() * 1000.0 / runs as f64;
    println!();
    println!("═══════════════════════════════════════════════");
    println!("  TILING BENCHMARK: {rule}");
    println!("═══════════════════════════════════════════════");
    println!("  Nodes: {}", tiling.len());
    println!("  Layers: {}", tiling.stats.layers_completed);
    println!("  Transform applications: {}", tiling.stats.iterations);
    println!("  Duplicates discarded: {}", tiling.stats.duplicates_discarded);
    println!("  Stop: {:?}", tiling.stats.stop_reason);
    println!("  Time (total): {:.2}ms", total.as_secs_f64() * 1000.0);
    println!("  Time (avg): {avg_ms:.3}ms");
    println!("  Time (best): {:.3}ms", fastest.as_secs_f64() * 1000.0);
    if !tiling.is_empty() {
        println!("  Avg per node: {:.4}ms", avg_ms / tiling.len() as f64);
    }
    println!("═══════════════════════════════════════════════");
    Ok(())
}
