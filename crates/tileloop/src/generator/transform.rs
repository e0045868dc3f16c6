//! Transform propagation.
//!
//! Each growth layer applies every transform, in rule order, to the basis
//! `new layer ∪ seed ∪ clones produced so far in this layer`. Clones are
//! fresh polygons; placed nodes are never mutated. At the end of a layer
//! the clones are merged through the spatial hash and the nodes actually
//! added become the next layer's basis.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::time::Instant;

use tracing::{debug, trace};

use crate::config::Config;
use crate::geometry::{Vector2, sort_by_angle_and_distance};
use crate::polygon::Polygon;
use crate::rule::{AnchorKind, AnchorRef, Transform, TransformKind};
use crate::spatial::{SpatialGrid, dedupe_points};
use crate::tiling::{GenerationStats, StopReason};

use super::GenerateError;

/// A resolved transform anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Vector2,
    /// Direction of the tiling edge a halfway anchor sits on.
    pub line: Option<Vector2>,
}

/// Run every growth layer over `nodes` (the placed seed).
pub fn propagate(
    nodes: Vec<Polygon>,
    transforms: &[Transform],
    config: &Config,
) -> Result<(Vec<Polygon>, GenerationStats), GenerateError> {
    let mut run = Propagation::new(nodes, transforms, config);
    run.run()?;
    Ok((run.nodes, run.stats))
}

struct Propagation<'a> {
    nodes: Vec<Polygon>,
    transforms: &'a [Transform],
    config: &'a Config,
    anchors: Vec<Option<Anchor>>,
    seed: Vec<usize>,
    layer: Vec<usize>,
    stats: GenerationStats,
}

impl<'a> Propagation<'a> {
    fn new(nodes: Vec<Polygon>, transforms: &'a [Transform], config: &'a Config) -> Self {
        let all: Vec<usize> = (0..nodes.len()).collect();
        Self {
            nodes,
            transforms,
            config,
            anchors: vec![None; transforms.len()],
            seed: all.clone(),
            layer: all,
            stats: GenerationStats::default(),
        }
    }

    fn run(&mut self) -> Result<(), GenerateError> {
        let layers = self.config.transform_steps;
        let limits = self.config.limits;
        let start = Instant::now();
        let over_budget = |start: &Instant| start.elapsed().as_millis() > limits.time_budget_ms as u128;
        let transforms = self.transforms;
        let last = transforms.len().saturating_sub(1);

        'layers: for s in 0..layers {
            let mut candidates: Vec<Polygon> = Vec::new();
            let mut stop = None;

            for (i, t) in transforms.iter().enumerate() {
                if s == layers - 1 && i == last {
                    break;
                }
                if self.stats.iterations >= limits.max_iterations {
                    stop = Some(StopReason::IterationLimit);
                    break;
                }
                if over_budget(&start) {
                    stop = Some(StopReason::TimeBudget);
                    break;
                }
                if s == 0 && self.anchors[i].is_none() {
                    if let Some(anchor_ref) = t.anchor {
                        self.anchors[i] = Some(self.resolve_anchor(anchor_ref, &candidates, t)?);
                    }
                }

                let produced = self.apply(t, self.anchors[i], &candidates);
                trace!(layer = s, transform = %t, produced = produced.len(), "transform applied");
                self.stats.candidates += produced.len();
                candidates.extend(produced);
                self.stats.iterations += 1;
            }

            self.layer = self.merge(candidates);
            self.stats.layers_completed = s + 1;
            debug!(layer = s, added = self.layer.len(), total = self.nodes.len(), "layer merged");

            if let Some(reason) = stop {
                self.stats.stop_reason = reason;
                break 'layers;
            }
            if self.nodes.len() > limits.max_nodes {
                self.stats.stop_reason = StopReason::NodeLimit;
                break;
            }
            if over_budget(&start) {
                self.stats.stop_reason = StopReason::TimeBudget;
                break;
            }
        }

        if self.stats.stop_reason != StopReason::Completed {
            debug!(reason = ?self.stats.stop_reason, nodes = self.nodes.len(), "generation bound hit");
        }
        Ok(())
    }

    /// Current basis, deduplicated by centroid.
    fn basis<'b>(&'b self, extra: &'b [Polygon]) -> Vec<&'b Polygon> {
        let tol = self.config.tolerance;
        let mut grid = SpatialGrid::new(tol);
        let mut out = Vec::new();
        let placed = self.layer.iter().chain(&self.seed).map(|&i| &self.nodes[i]);
        for node in placed.chain(extra) {
            let c = node.centroid();
            if grid.find(c).is_none() {
                grid.insert(c, ());
                out.push(node);
            }
        }
        out
    }

    fn apply(&self, t: &Transform, anchor: Option<Anchor>, candidates: &[Polygon]) -> Vec<Polygon> {
        match (t.kind, anchor) {
            (TransformKind::Mirror, None) => self.mirror_by_angle(t.angle, candidates),
            (TransformKind::Mirror, Some(a)) => self.mirror_relative_to(a, candidates),
            (TransformKind::Rotate, None) => self.rotate_by_angle(t.angle, candidates),
            (TransformKind::Rotate, Some(a)) => self.rotate_relative_to(a, t.angle, candidates),
            (TransformKind::Translate, Some(a)) => self.translate_relative_to(a, candidates),
            (TransformKind::Translate, None) => Vec::new(),
        }
    }

    /// Reflect across axes at `angle + π/2`, `2·angle + π/2`, ... below a
    /// full turn. Each axis also reflects the clones of earlier axes.
    fn mirror_by_angle(&self, angle: f64, candidates: &[Polygon]) -> Vec<Polygon> {
        let mut axes = Vec::new();
        let mut a = angle;
        while a < TAU && a > 0.0 {
            axes.push(a + FRAC_PI_2);
            a *= 2.0;
        }

        let mut produced: Vec<Polygon> = Vec::new();
        for axis in axes {
            let mut extra: Vec<Polygon> = candidates.to_vec();
            extra.extend(produced.iter().cloned());
            let clones: Vec<Polygon> = self
                .basis(&extra)
                .into_iter()
                .map(|node| {
                    let angle = (2.0 * axis - node.angle() + TAU) % TAU;
                    node.with_placement(node.centroid().mirror(axis), angle)
                })
                .collect();
            produced.extend(clones);
        }
        produced
    }

    fn mirror_relative_to(&self, anchor: Anchor, candidates: &[Polygon]) -> Vec<Polygon> {
        let origin = anchor.point;
        self.basis(candidates)
            .into_iter()
            .map(|node| match anchor.line {
                Some(line) => {
                    let centroid = node.centroid().mirror_across_line(origin, line);
                    let angle = (2.0 * line.heading() - node.angle() + TAU) % TAU;
                    node.with_placement(centroid, angle)
                }
                None => {
                    let centroid = origin - (node.centroid() - origin);
                    node.with_placement(centroid, (PI + node.angle()) % TAU)
                }
            })
            .collect()
    }

    fn rotate_relative_to(&self, anchor: Anchor, step: f64, candidates: &[Polygon]) -> Vec<Polygon> {
        let basis = self.basis(candidates);
        let mut produced = Vec::new();
        let mut alfa = step;
        while alfa < TAU && step > 0.0 {
            for node in &basis {
                let centroid = node.centroid().rotate_around(anchor.point, alfa);
                produced.push(node.with_placement(centroid, (alfa + node.angle()) % TAU));
            }
            alfa += step;
        }
        produced
    }

    fn rotate_by_angle(&self, step: f64, candidates: &[Polygon]) -> Vec<Polygon> {
        let tol = self.config.tolerance;
        let basis = self.basis(candidates);
        let mut cache: HashMap<(u64, u64, u64), Vector2> = HashMap::new();
        let mut produced = Vec::new();
        let mut angle = step;
        while angle < TAU && step > 0.0 {
            for node in &basis {
                let c = node.centroid();
                let key = (c.x.to_bits(), c.y.to_bits(), angle.to_bits());
                let pos = *cache.entry(key).or_insert_with(|| {
                    let d = c.mag();
                    if d < tol { Vector2::ZERO } else { Vector2::from_angle(c.heading() + angle) * d }
                });
                produced.push(node.with_placement(pos, (node.angle() + angle) % TAU));
            }
            angle += step;
        }
        produced
    }

    fn translate_relative_to(&self, anchor: Anchor, candidates: &[Polygon]) -> Vec<Polygon> {
        self.basis(candidates)
            .into_iter()
            .map(|node| node.with_placement(node.centroid() + anchor.point, node.angle()))
            .collect()
    }

    /// Merge clones into the node list, returning the indices added.
    fn merge(&mut self, candidates: Vec<Polygon>) -> Vec<usize> {
        let tol = self.config.tolerance;
        let mut grid = SpatialGrid::new(tol);
        for (i, node) in self.nodes.iter().enumerate() {
            grid.insert(node.centroid(), i);
        }

        let mut added = Vec::new();
        for node in candidates {
            let c = node.centroid();
            if !c.is_finite() || grid.find(c).is_some() {
                self.stats.duplicates_discarded += 1;
                continue;
            }
            let index = self.nodes.len();
            grid.insert(c, index);
            self.nodes.push(node);
            added.push(index);
        }
        added
    }

    /// Resolve an anchor against the placed nodes plus this layer's clones.
    fn resolve_anchor(
        &self,
        anchor: AnchorRef,
        candidates: &[Polygon],
        t: &Transform,
    ) -> Result<Anchor, GenerateError> {
        let tol = self.config.tolerance;
        let pool: Vec<&Polygon> = self.nodes.iter().chain(candidates).collect();
        let point = find_origin(&pool, anchor, tol)
            .ok_or_else(|| GenerateError::AnchorNotFound { transform: t.to_string() })?;

        let line = if anchor.kind == AnchorKind::Halfway {
            pool.iter().find_map(|node| {
                let v = node.vertices();
                node.halfways()
                    .position(|h| h.approx_eq(point, tol))
                    .map(|k| (v[(k + 1) % v.len()] - v[k]).normalize())
            })
        } else {
            None
        };
        trace!(transform = %t, ?point, "anchor resolved");
        Ok(Anchor { point, line })
    }
}

/// The `index`-th (1-based) distinct feature point of `nodes`, ordered
/// clockwise from +y then by distance. Centroid anchors skip the origin.
pub fn find_origin(nodes: &[&Polygon], anchor: AnchorRef, tolerance: f64) -> Option<Vector2> {
    let raw: Vec<Vector2> = match anchor.kind {
        AnchorKind::Centroid => nodes.iter().map(|n| n.centroid()).collect(),
        AnchorKind::Halfway => nodes.iter().flat_map(|n| n.halfways()).collect(),
        AnchorKind::Vertex => nodes.iter().flat_map(|n| n.vertices().iter().copied()).collect(),
    };
    let mut points = dedupe_points(&raw, tolerance);
    sort_by_angle_and_distance(&mut points, tolerance);
    if anchor.kind == AnchorKind::Centroid {
        points.retain(|p| !p.approx_eq(Vector2::ZERO, tolerance));
    }
    points.get(anchor.index.checked_sub(1)?).copied()
}
