//! Tiling generation.
//!
//! `rule string -> seed -> transform layers -> (dual) -> neighbor graph`
//!
//! # Algorithm
//!
//! 1. Place the core shape, then attach each seed layer to the free edges
//!    of what is already placed ([`seed`])
//! 2. For each growth layer, apply every transform to the current basis
//!    and merge the clones through the spatial hash ([`transform`])
//! 3. Optionally replace the node list with its dual ([`dual`])
//! 4. Compute the K-hop neighbor sets ([`neighbors`])
//!
//! [`growth`] is an alternative to steps 1-2 that grows a tiling from
//! known vertex configurations instead of a rule.

pub mod dual;
pub mod growth;
pub mod neighbors;
pub mod seed;
pub mod transform;

use std::time::Instant;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::rule::{ParsedRule, RuleError, parse_rule};
use crate::tiling::Tiling;

/// Generation failure. Bound hits are not errors; see
/// [`StopReason`](crate::tiling::StopReason).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("seed has no core shape")]
    EmptySeed,
    #[error("no free edge for seed layer {layer}, slot {slot}")]
    NoFreeEdge { layer: usize, slot: usize },
    #[error("anchor `{transform}` does not exist in the seed")]
    AnchorNotFound { transform: String },
}

/// Builds tilings from rule strings.
#[derive(Debug, Clone, Default)]
pub struct TilingGenerator {
    config: Config,
}

impl TilingGenerator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse `rule` and generate its tiling.
    pub fn generate(&self, rule: &str) -> Result<Tiling, GenerateError> {
        let parsed = parse_rule(rule)?;
        self.generate_parsed(parsed)
    }

    pub fn generate_parsed(&self, rule: ParsedRule) -> Result<Tiling, GenerateError> {
        let start = Instant::now();
        let tol = self.config.tolerance;

        let seed_nodes = seed::place_seed(&rule, &self.config)?;
        let seed_count = seed_nodes.len();
        debug!(rule = %rule, seed_nodes = seed_count, "seed placed");

        let (nodes, mut stats) = transform::propagate(seed_nodes, &rule.transforms, &self.config)?;
        stats.seed_nodes = seed_count;

        let nodes = if rule.dual { dual::dual_nodes(&nodes, tol) } else { nodes };

        let mut tiling = Tiling::new(nodes, rule.dual, Some(rule));
        tiling.compute_neighbors(self.config.neighbor_depth, self.config.neighborhood, tol);
        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tiling.stats = stats;

        info!(
            rule = %tiling.rule_string(),
            nodes = tiling.len(),
            dual = tiling.is_dual,
            stop = ?tiling.stats.stop_reason,
            elapsed_ms = tiling.stats.elapsed_ms,
            "tiling generated"
        );
        Ok(tiling)
    }

    /// Grow a tiling from vertex configurations instead of a rule.
    pub fn grow_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Tiling {
        let start = Instant::now();
        let (nodes, mut stats) = growth::grow(rng, &self.config);
        let mut tiling = Tiling::new(nodes, false, None);
        tiling.compute_neighbors(
            self.config.neighbor_depth,
            self.config.neighborhood,
            self.config.tolerance,
        );
        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tiling.stats = stats;
        info!(nodes = tiling.len(), "random tiling grown");
        tiling
    }
}
