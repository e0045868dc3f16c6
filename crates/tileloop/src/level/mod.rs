//! Connector-loop puzzle on top of a tiling.
//!
//! Every interior edge pair carries one connector weight on both of its
//! sides and every boundary edge carries none, so the freshly weighted
//! tiling is solved. The level then turns each tile at random; the player
//! turns (and, through effects, mirrors) tiles until every pair matches
//! again.
//!
//! ## Rust Lesson #24: Arenas instead of back-references
//!
//! An [`Effect`] couples one tile to another. Instead of storing a
//! reference to the target tile (which would alias the `Vec<Polygon>` the
//! level owns), it stores the target's index. The level resolves it with
//! a plain `&mut self.tiling.nodes[target]` at the moment it applies, so
//! the borrow checker never sees two live `&mut` to the same node list.

pub mod effects;
pub mod format;

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CONNECTOR_WEIGHTS, Config};
use crate::cycle::{Symmetries, canonical_form, pick_weighted, symmetries};
use crate::generator::{GenerateError, TilingGenerator};
use crate::polygon::{Polygon, TileClass};
use crate::spatial::SpatialGrid;
use crate::tiling::Tiling;

pub use effects::{Effect, EffectKind};

// ============================================================================
// Edge pairing
// ============================================================================

/// One edge of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    pub node: usize,
    pub edge: usize,
}

/// Coincident edge pairs and the edges left without a partner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePairing {
    pub pairs: Vec<(EdgeRef, EdgeRef)>,
    pub boundary: Vec<EdgeRef>,
}

/// Pair every edge midpoint with a coincident midpoint of another node.
///
/// Edges are visited in node order, then edge order; each edge is used by
/// at most one pair.
pub fn pair_edges(nodes: &[Polygon], tolerance: f64) -> EdgePairing {
    let mut grid: SpatialGrid<EdgeRef> = SpatialGrid::new(tolerance);
    for (i, node) in nodes.iter().enumerate() {
        for (e, h) in node.halfways().enumerate() {
            grid.insert(h, EdgeRef { node: i, edge: e });
        }
    }

    let mut taken: Vec<Vec<bool>> = nodes.iter().map(|n| vec![false; n.edges().len()]).collect();
    let mut pairing = EdgePairing::default();

    for (i, node) in nodes.iter().enumerate() {
        for (e, h) in node.halfways().enumerate() {
            if taken[i][e] {
                continue;
            }
            taken[i][e] = true;
            let this = EdgeRef { node: i, edge: e };
            let partner = grid.near(h).copied().find(|r| r.node != i && !taken[r.node][r.edge]);
            match partner {
                Some(other) => {
                    taken[other.node][other.edge] = true;
                    pairing.pairs.push((this, other));
                }
                None => pairing.boundary.push(this),
            }
        }
    }
    pairing
}

// ============================================================================
// Tile classes
// ============================================================================

/// Canonical class of a tile's connector cycle.
pub fn tile_class(node: &Polygon) -> TileClass {
    let canonical = canonical_form(&node.weights());
    let digits: String = canonical.cycle.iter().map(|w| w.to_string()).collect();
    TileClass {
        label: format!("{}/{}", node.sides(), digits),
        turns: canonical.turns,
        mirrored: canonical.mirrored,
    }
}

/// Every canonical connector cycle of length `n` over weights `0..m`.
///
/// Returns an empty list when `m^n` does not fit in a `u64`.
pub fn possible_configurations(n: u32, m: u8) -> Vec<Vec<u8>> {
    let Some(total) = (m as u64).checked_pow(n) else {
        return Vec::new();
    };
    let mut seen = std::collections::BTreeSet::new();
    for mut k in 0..total {
        let mut digits = vec![0u8; n as usize];
        for slot in digits.iter_mut().rev() {
            *slot = (k % m as u64) as u8;
            k /= m as u64;
        }
        seen.insert(canonical_form(&digits).cycle);
    }
    seen.into_iter().collect()
}

/// Forward turns that bring `node` back to turn 0, or 0 without connectors.
pub fn turns_to_solve(node: &Polygon) -> u32 {
    if !node.has_connector() {
        return 0;
    }
    let sides = node.sides().max(1) as i32;
    ((sides - node.turns().rem_euclid(sides)) % sides) as u32
}

// ============================================================================
// Level
// ============================================================================

/// A puzzle level: a tiling plus connectors, scramble state and effects.
#[derive(Debug, Clone)]
pub struct Level {
    tiling: Tiling,
    config: Config,
    effects: Vec<Effect>,
    min_moves_to_solve: u32,
    moves_made: u32,
    solved: bool,
    is_frozen: bool,
}

impl Level {
    /// Level with no weights, no scramble and no effects.
    fn assemble(tiling: Tiling, config: &Config) -> Self {
        Self {
            tiling,
            config: config.clone(),
            effects: Vec::new(),
            min_moves_to_solve: 0,
            moves_made: 0,
            solved: false,
            is_frozen: false,
        }
    }

    /// Weighted, shuffled level without effects.
    pub fn new<R: Rng + ?Sized>(tiling: Tiling, config: &Config, rng: &mut R) -> Self {
        Self::build(tiling, config, 0, rng)
    }

    /// Weighted, shuffled level with up to `effect_count` effects.
    ///
    /// Effects are attached before the shuffle so they take part in it.
    pub fn build<R: Rng + ?Sized>(
        tiling: Tiling,
        config: &Config,
        effect_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut level = Self::assemble(tiling, config);
        level.assign_weights(rng);
        level.attach_effects(rng, effect_count);
        level.shuffle(rng);
        level.classify_tiles();
        level.check_solved();
        info!(
            tiles = level.len(),
            effects = level.effects.len(),
            min_moves = level.min_moves_to_solve,
            solved = level.solved,
            "level built"
        );
        level
    }

    /// Generate the tiling for `rule` and build a level on it.
    pub fn from_rule<R: Rng + ?Sized>(
        rule: &str,
        config: &Config,
        rng: &mut R,
    ) -> Result<Self, GenerateError> {
        let tiling = TilingGenerator::new(config.clone()).generate(rule)?;
        Ok(Self::new(tiling, config, rng))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    #[inline]
    pub fn nodes(&self) -> &[Polygon] {
        &self.tiling.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiling.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiling.is_empty()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Effects owned by tile `index`.
    pub fn effects_for(&self, index: usize) -> impl Iterator<Item = &Effect> + '_ {
        self.effects.iter().filter(move |e| e.owner == index)
    }

    /// Rough upper bound: over tiles with a connector, the forward turns
    /// needed to bring each back to turn 0. Tile symmetry and effects are
    /// not taken into account. Built and imported levels count the same way.
    #[inline]
    pub fn min_moves_to_solve(&self) -> u32 {
        self.min_moves_to_solve
    }

    #[inline]
    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    /// Result of the last solved check.
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    /// Symmetries of tile `index`'s connector cycle.
    pub fn tile_symmetries(&self, index: usize) -> Option<Symmetries> {
        self.tiling.nodes.get(index).map(|n| symmetries(&n.weights()))
    }

    /// Tile count per tile-type label.
    pub fn tile_types(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.tiling.nodes {
            *counts.entry(node.tile.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    // ------------------------------------------------------------------
    // Construction steps
    // ------------------------------------------------------------------

    fn assign_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let pairing = pair_edges(&self.tiling.nodes, self.config.tolerance);
        let nodes = &mut self.tiling.nodes;
        for (a, b) in &pairing.pairs {
            let weight = pick_weighted(rng, &CONNECTOR_WEIGHTS, &self.config.weights)
                .copied()
                .unwrap_or(0);
            nodes[a.node].set_weight(a.edge, weight);
            nodes[b.node].set_weight(b.edge, weight);
        }
        for r in &pairing.boundary {
            nodes[r.node].set_weight(r.edge, 0);
        }
        debug!(pairs = pairing.pairs.len(), boundary = pairing.boundary.len(), "connectors assigned");
    }

    /// Turn every tile by a random count in `[0, n-1)`.
    fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for index in 0..self.tiling.nodes.len() {
            let n = self.tiling.nodes[index].sides();
            let turns = if n > 1 { rng.random_range(0..n - 1) } else { 0 };
            for _ in 0..turns {
                self.turn(index, 1);
            }
        }
        self.count_min_moves();
    }

    /// Sum [`turns_to_solve`] over every tile.
    pub(crate) fn count_min_moves(&mut self) {
        self.min_moves_to_solve = self.tiling.nodes.iter().map(turns_to_solve).sum();
    }

    /// Recompute every tile's canonical class.
    pub fn classify_tiles(&mut self) {
        for node in &mut self.tiling.nodes {
            node.tile = tile_class(node);
        }
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// One step on tile `index`, then its effects.
    fn turn(&mut self, index: usize, step: i32) {
        self.tiling.nodes[index].rotate(step);
        self.resolve_effects(index, step);
    }

    fn resolve_effects(&mut self, owner: usize, step: i32) {
        for effect in self.effects.iter().filter(|e| e.owner == owner) {
            effect.resolve(&mut self.tiling.nodes, step);
        }
    }

    /// Player move: turn tile `index` by `turns` steps.
    ///
    /// Returns `false` when the level is frozen or the tile doesn't exist.
    /// A zero turn is accepted but is not counted as a move.
    pub fn rotate_tile(&mut self, index: usize, turns: i32) -> bool {
        if self.is_frozen || index >= self.tiling.nodes.len() {
            return false;
        }
        if turns == 0 {
            return true;
        }
        let step = turns.signum();
        for _ in 0..turns.unsigned_abs() {
            self.turn(index, step);
        }
        self.after_move();
        true
    }

    /// Player move: mirror tile `index`.
    pub fn mirror_tile(&mut self, index: usize) -> bool {
        if self.is_frozen || index >= self.tiling.nodes.len() {
            return false;
        }
        self.tiling.nodes[index].mirror();
        self.resolve_effects(index, 1);
        self.after_move();
        true
    }

    fn after_move(&mut self) {
        self.moves_made += 1;
        self.classify_tiles();
        if self.check_solved() {
            info!(moves = self.moves_made, "level solved");
        }
    }

    /// Re-pair all edges and update every connector's `matched` flag.
    ///
    /// A pair matches when both sides carry the same weight; a boundary
    /// edge matches when it carries none. A solved level freezes.
    pub fn check_solved(&mut self) -> bool {
        let pairing = pair_edges(&self.tiling.nodes, self.config.tolerance);
        let nodes = &mut self.tiling.nodes;
        for node in nodes.iter_mut() {
            for e in 0..node.edges().len() {
                node.set_matched(e, false);
            }
        }

        let mut solved = true;
        for (a, b) in &pairing.pairs {
            if nodes[a.node].edges()[a.edge].weight == nodes[b.node].edges()[b.edge].weight {
                nodes[a.node].set_matched(a.edge, true);
                nodes[b.node].set_matched(b.edge, true);
            } else {
                solved = false;
            }
        }
        for r in &pairing.boundary {
            let matched = nodes[r.node].edges()[r.edge].weight == 0;
            nodes[r.node].set_matched(r.edge, matched);
            solved &= matched;
        }

        self.solved = solved;
        if solved {
            self.is_frozen = true;
        }
        solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn square_grid(size: i32) -> Tiling {
        let mut nodes = Vec::new();
        for y in 0..size {
            for x in 0..size {
                nodes.push(Polygon::regular(Vector2::new(x as f64, y as f64), 4, FRAC_PI_4, 0.01));
            }
        }
        Tiling::new(nodes, false, None)
    }

    fn position_to_weight(p: &Polygon) -> Vec<((i64, i64), u8)> {
        let mut pairs: Vec<((i64, i64), u8)> = p
            .edges()
            .iter()
            .map(|e| (((e.position.x * 1000.0).round() as i64, (e.position.y * 1000.0).round() as i64), e.weight))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn grid_pairs_interior_edges() {
        let tiling = square_grid(3);
        let pairing = pair_edges(&tiling.nodes, 0.01);
        assert_eq!(pairing.pairs.len(), 12, "3x3 grid has 12 shared edges");
        assert_eq!(pairing.boundary.len(), 12);
        for (a, b) in &pairing.pairs {
            assert_ne!(a.node, b.node);
        }
    }

    #[test]
    fn fresh_weights_are_solved() {
        let mut level = Level::assemble(square_grid(3), &Config::default());
        level.assign_weights(&mut StdRng::seed_from_u64(5));
        let pairing = pair_edges(level.nodes(), 0.01);
        for (a, b) in &pairing.pairs {
            assert_eq!(level.nodes()[a.node].edges()[a.edge].weight, level.nodes()[b.node].edges()[b.edge].weight);
        }
        for r in &pairing.boundary {
            assert_eq!(level.nodes()[r.node].edges()[r.edge].weight, 0);
        }
        assert!(level.check_solved());
        assert!(level.nodes().iter().all(|n| n.edges().iter().all(|e| e.matched)));
    }

    #[test]
    fn single_node_level_is_solved_and_frozen() {
        let tiling = Tiling::new(vec![Polygon::regular(Vector2::ZERO, 6, 0.0, 0.01)], false, None);
        let mut level = Level::new(tiling, &Config::default(), &mut StdRng::seed_from_u64(1));
        assert!(level.is_solved());
        assert!(level.is_frozen());
        assert!(!level.rotate_tile(0, 1), "frozen level must refuse moves");
        assert_eq!(level.moves_made(), 0);
    }

    #[test]
    fn shuffle_accumulates_min_moves() {
        let level = Level::new(square_grid(4), &Config::default(), &mut StdRng::seed_from_u64(9));
        let expected: u32 = level
            .nodes()
            .iter()
            .filter(|n| n.has_connector())
            .map(|n| (4 - n.turns() as u32) % 4)
            .sum();
        assert_eq!(level.min_moves_to_solve(), expected);
        for node in level.nodes() {
            assert!((0..3).contains(&node.turns()), "turns {} outside [0, n-1)", node.turns());
        }
    }

    #[test]
    fn zero_turn_is_not_a_move() {
        let mut level = Level::assemble(square_grid(2), &Config::default());
        assert!(level.rotate_tile(0, 0));
        assert_eq!(level.moves_made(), 0);
        assert!(level.rotate_tile(0, 1));
        assert_eq!(level.moves_made(), 1);
    }

    #[test]
    fn turns_to_solve_wraps_and_skips_bare_tiles() {
        let mut node = Polygon::regular(Vector2::ZERO, 4, 0.0, 0.01);
        node.rotate(1);
        assert_eq!(turns_to_solve(&node), 0, "no connector, nothing to solve");
        node.set_weight(0, 1);
        assert_eq!(turns_to_solve(&node), 3);
        node.rotate(3);
        assert_eq!(turns_to_solve(&node), 0);
        node.rotate(-5);
        assert_eq!(turns_to_solve(&node), 1);
    }

    #[test]
    fn triangle_returns_after_full_cycle() {
        let tiling = Tiling::new(vec![Polygon::regular(Vector2::ZERO, 3, PI / 3.0, 0.01)], false, None);
        let mut level = Level::assemble(tiling, &Config::default());
        for (i, w) in [1, 2, 0].into_iter().enumerate() {
            level.tiling.nodes[0].set_weight(i, w);
        }
        let before = position_to_weight(&level.nodes()[0]);

        level.turn(0, 1);
        assert_ne!(position_to_weight(&level.nodes()[0]), before);
        assert!(level.rotate_tile(0, 2));
        assert_eq!(position_to_weight(&level.nodes()[0]), before);
    }

    #[test]
    fn alternating_square_has_one_class() {
        let mut p = Polygon::regular(Vector2::ZERO, 4, FRAC_PI_4, 0.01);
        for (i, w) in [1, 2, 1, 2].into_iter().enumerate() {
            p.set_weight(i, w);
        }
        for _ in 0..4 {
            p.rotate(1);
            assert_eq!(tile_class(&p).label, "4/1212");
        }
        p.mirror();
        assert_eq!(tile_class(&p).label, "4/1212");
    }

    #[test]
    fn configuration_counts() {
        assert_eq!(possible_configurations(3, 2).len(), 4);
        assert_eq!(possible_configurations(4, 2).len(), 6);
        assert_eq!(possible_configurations(4, 3)[0], vec![0, 0, 0, 0]);
    }

    #[test]
    fn rotate_effect_follows_owner() {
        let tiling = Tiling::new(
            vec![
                Polygon::regular(Vector2::ZERO, 4, FRAC_PI_4, 0.01),
                Polygon::regular(Vector2::new(1.0, 0.0), 4, FRAC_PI_4, 0.01),
            ],
            false,
            None,
        );
        let mut level = Level::assemble(tiling, &Config::default());
        level.effects.push(Effect { owner: 0, target: 1, kind: EffectKind::Rotate { turns: 1 } });
        level.tiling.nodes[0].set_weight(0, 1);

        assert!(level.rotate_tile(0, 2));
        assert_eq!(level.nodes()[0].turns(), 2);
        assert_eq!(level.nodes()[1].turns(), 2, "one target turn per owner turn");
        assert_eq!(level.moves_made(), 1);
    }

    #[test]
    fn mirror_effect_flips_target() {
        let tiling = Tiling::new(
            vec![
                Polygon::regular(Vector2::ZERO, 4, FRAC_PI_4, 0.01),
                Polygon::regular(Vector2::new(1.0, 0.0), 4, FRAC_PI_4, 0.01),
            ],
            false,
            None,
        );
        let mut level = Level::assemble(tiling, &Config::default());
        level.effects.push(Effect { owner: 0, target: 1, kind: EffectKind::Mirror });
        level.tiling.nodes[0].set_weight(0, 1);

        assert!(level.mirror_tile(0));
        assert!(level.nodes()[0].is_mirrored());
        assert!(level.nodes()[1].is_mirrored());
        assert_eq!(level.effects_for(0).count(), 1);
        assert_eq!(level.effects_for(1).count(), 0);
    }

    #[test]
    fn tile_types_are_assigned() {
        let level = Level::new(square_grid(3), &Config::default(), &mut StdRng::seed_from_u64(2));
        let total: usize = level.tile_types().values().sum();
        assert_eq!(total, 9);
        assert!(level.nodes().iter().all(|n| n.tile.label.starts_with("4/")));
    }
}
