//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tileloop::{Config, Neighborhood, catalog};
use tracing::{debug, info};

/// Load settings from a YAML file, or defaults when no file is given.
///
/// Missing keys keep their default values.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Generation flags that override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct GenerationArgs {
    /// Number of growth layers
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Coincidence tolerance
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Isotoxal angle parameter in degrees
    #[arg(long)]
    pub parameter: Option<f64>,

    /// Stop generating past this many tiles
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Count vertex-sharing tiles as neighbors
    #[arg(long)]
    pub moore: bool,

    /// Neighbor depth (rings of adjacency)
    #[arg(long)]
    pub depth: Option<usize>,
}

impl GenerationArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(steps) = self.steps {
            config.transform_steps = steps;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(parameter) = self.parameter {
            config.parameter = parameter;
        }
        if let Some(max_nodes) = self.max_nodes {
            config.limits.max_nodes = max_nodes;
        }
        if self.moore {
            config.neighborhood = Neighborhood::Moore;
        }
        if let Some(depth) = self.depth {
            config.neighbor_depth = depth;
        }
    }
}

/// Accept a catalog name in place of a rule string.
///
/// `dual` appends the dual marker when the rule lacks one.
pub fn resolve_rule(input: &str, dual: bool) -> String {
    let rule = match catalog::find(input) {
        Some(entry) => {
            debug!(name = entry.name, rule = entry.rule, "resolved catalog name");
            entry.rule.to_string()
        }
        None => input.trim().to_string(),
    };
    if dual && !rule.ends_with('*') { format!("{rule}*") } else { rule }
}

/// Seeded RNG. Without a seed one is drawn and logged so runs can be repeated.
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, "rng seeded");
    (StdRng::seed_from_u64(seed), seed)
}

/// Write to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = contents.len(), "wrote output");
        }
        None => print!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_resolve_to_rules() {
        assert_eq!(resolve_rule("square", false), "4-4-0,4/r90/m(v2)");
        assert_eq!(resolve_rule("hexagonal", true), "6/r60/r(h1)*");
        assert_eq!(resolve_rule("3/r60/r(h2)*", true), "3/r60/r(h2)*");
        assert_eq!(resolve_rule(" 6/r60/r(h1) ", false), "6/r60/r(h1)");
    }

    #[test]
    fn overrides_only_touch_given_flags() {
        let mut config = Config::default();
        let args = GenerationArgs { steps: Some(4), moore: true, ..Default::default() };
        args.apply(&mut config);
        assert_eq!(config.transform_steps, 4);
        assert_eq!(config.neighborhood, Neighborhood::Moore);
        assert_eq!(config.tolerance, Config::default().tolerance);
    }

    #[test]
    fn yaml_config_fills_defaults() {
        let config: Config = serde_yaml::from_str("transform_steps: 3\nlimits:\n  max_nodes: 40\n")
            .expect("yaml parses");
        assert_eq!(config.transform_steps, 3);
        assert_eq!(config.limits.max_nodes, 40);
        assert_eq!(config.limits.max_iterations, 100);
    }
}
