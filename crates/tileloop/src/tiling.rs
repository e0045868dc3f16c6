//! The generated node list and its neighbor graph.

use serde::{Deserialize, Serialize};

use crate::config::{ColorParams, Neighborhood};
use crate::generator::neighbors;
use crate::geometry::Vector2;
use crate::polygon::{Polygon, RenderNode};
use crate::rule::ParsedRule;

/// Why transform propagation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every requested layer ran.
    #[default]
    Completed,
    NodeLimit,
    IterationLimit,
    TimeBudget,
}

/// Counters from one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub seed_nodes: usize,
    pub layers_completed: usize,
    pub iterations: usize,
    /// Clones produced by transforms before deduplication.
    pub candidates: usize,
    pub duplicates_discarded: usize,
    pub elapsed_ms: f64,
    pub stop_reason: StopReason,
}

/// A generated tiling.
#[derive(Debug, Clone)]
pub struct Tiling {
    /// Insertion order is generation order; indices are stable ids.
    pub nodes: Vec<Polygon>,
    pub is_dual: bool,
    /// `None` for tilings that did not come from a rule string.
    pub rule: Option<ParsedRule>,
    pub stats: GenerationStats,
}

impl Tiling {
    pub fn new(nodes: Vec<Polygon>, is_dual: bool, rule: Option<ParsedRule>) -> Self {
        Self { nodes, is_dual, rule, stats: GenerationStats::default() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rule string as given, empty for grown tilings.
    pub fn rule_string(&self) -> String {
        self.rule.as_ref().map(|r| r.source.clone()).unwrap_or_default()
    }

    /// Stable tile id: index plus centroid to three decimals.
    pub fn tile_id(&self, index: usize) -> Option<String> {
        self.nodes.get(index).map(|node| tile_id(index, node.centroid()))
    }

    /// Index of the node whose id is `id`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        (0..self.nodes.len()).find(|&i| self.tile_id(i).as_deref() == Some(id))
    }

    /// Recompute every node's neighbor set.
    pub fn compute_neighbors(&mut self, depth: usize, neighborhood: Neighborhood, tolerance: f64) {
        neighbors::compute_neighbors(&mut self.nodes, depth, neighborhood, tolerance);
    }

    /// Axis-aligned bounding box over all vertices.
    pub fn bounds(&self) -> Option<(Vector2, Vector2)> {
        let mut iter = self.nodes.iter().flat_map(|n| n.vertices().iter().copied());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| {
            (Vector2::new(lo.x.min(v.x), lo.y.min(v.y)), Vector2::new(hi.x.max(v.x), hi.y.max(v.y)))
        }))
    }

    /// Renderer descriptors in node order.
    pub fn render_nodes(&self, color: &ColorParams) -> Vec<RenderNode> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| node.render_node(tile_id(i, node.centroid()), color))
            .collect()
    }
}

pub fn tile_id(index: usize, centroid: Vector2) -> String {
    format!("tile-{index}-{:.3}-{:.3}", centroid.x, centroid.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_ids_use_three_decimals() {
        assert_eq!(tile_id(4, Vector2::new(1.0, -0.5)), "tile-4-1.000--0.500");
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let t = Tiling::new(
            vec![
                Polygon::regular(Vector2::ZERO, 4, std::f64::consts::FRAC_PI_4, 0.01),
                Polygon::regular(Vector2::new(1.0, 0.0), 4, std::f64::consts::FRAC_PI_4, 0.01),
            ],
            false,
            None,
        );
        let (lo, hi) = t.bounds().expect("non-empty tiling");
        assert!(lo.approx_eq(Vector2::new(-0.5, -0.5), 1e-9));
        assert!(hi.approx_eq(Vector2::new(1.5, 0.5), 1e-9));
        assert_eq!(t.index_of("tile-1-1.000-0.000"), Some(1));
    }
}
