//! Seed placement.
//!
//! The core shape sits at the origin. Each following layer attaches its
//! shapes to free edges of the nodes placed so far, consumed in clockwise
//! order from +y (ties broken by distance from the origin). A `0` entry
//! skips one free edge.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::trace;

use crate::config::Config;
use crate::geometry::{Vector2, apothem, sort_by_key_point};
use crate::polygon::Polygon;
use crate::rule::{ParsedRule, ShapeSpec};
use crate::spatial::SpatialGrid;

use super::GenerateError;

/// A free edge: node index into the placed list and edge index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeEdge {
    pub node: usize,
    pub edge: usize,
}

/// Place the core and every seed layer.
pub fn place_seed(rule: &ParsedRule, config: &Config) -> Result<Vec<Polygon>, GenerateError> {
    let core = rule.core().filter(|c| !c.is_placeholder()).ok_or(GenerateError::EmptySeed)?;
    let mut nodes = vec![core_node(core, config)];

    for (layer_index, layer) in rule.seed.iter().enumerate().skip(1) {
        let mut pending: Vec<Polygon> = Vec::new();
        let mut offset = 0;
        for spec in layer {
            if spec.is_placeholder() {
                offset += 1;
                continue;
            }
            let free = free_edges(&nodes, &pending, config.tolerance);
            let anchor = free
                .get(offset)
                .copied()
                .ok_or(GenerateError::NoFreeEdge { layer: layer_index, slot: offset })?;
            trace!(layer = layer_index, node = anchor.node, edge = anchor.edge, "seed anchor");
            pending.push(attach(spec, &nodes[anchor.node], anchor.edge, config));
        }
        nodes.extend(pending);
    }
    Ok(nodes)
}

/// Core node for the first shape of the rule.
pub fn core_node(spec: &ShapeSpec, config: &Config) -> Polygon {
    let tol = config.tolerance;
    match *spec {
        ShapeSpec::Isotoxal { sides, alfa } => {
            Polygon::isotoxal(Vector2::ZERO, sides, alfa.radians(config.parameter), PI / sides as f64, tol)
        }
        ShapeSpec::Star { sides, m } => Polygon::star(Vector2::ZERO, sides, m, PI / sides as f64, tol),
        ShapeSpec::Regular { sides, special: true } => {
            Polygon::regular(Vector2::ZERO, sides, -FRAC_PI_2, tol)
        }
        ShapeSpec::Regular { sides: 3, special: false } => {
            Polygon::regular(Vector2::new(3f64.sqrt() / 6.0, 0.5), 3, 0.0, tol)
        }
        ShapeSpec::Regular { sides, special: false } => {
            Polygon::regular(Vector2::ZERO, sides, PI / sides as f64, tol)
        }
    }
}

/// Edges of `placed` that no other placed or pending node shares.
pub fn free_edges(placed: &[Polygon], pending: &[Polygon], tolerance: f64) -> Vec<FreeEdge> {
    let mut grid: SpatialGrid<Vector2> = SpatialGrid::new(tolerance);
    for node in placed.iter().chain(pending) {
        for h in node.halfways() {
            grid.insert(h, node.centroid());
        }
    }

    let mut free: Vec<FreeEdge> = Vec::new();
    for (i, node) in placed.iter().enumerate() {
        let own = node.centroid();
        for (s, h) in node.halfways().enumerate() {
            if grid.near(h).all(|owner| owner.approx_eq(own, tolerance)) {
                free.push(FreeEdge { node: i, edge: s });
            }
        }
    }

    sort_by_key_point(&mut free, |f| placed[f.node].edges()[f.edge].position, tolerance);
    free
}

/// New node for `spec` sharing edge `edge` of `host`, on its outside.
pub fn attach(spec: &ShapeSpec, host: &Polygon, edge: usize, config: &Config) -> Polygon {
    let tol = config.tolerance;
    let v = host.vertices();
    let count = v.len();
    let first = v[edge];
    let second = v[(edge + 1) % count];
    let halfway = host.edges()[edge].position;

    match *spec {
        ShapeSpec::Regular { sides, .. } => {
            let dir = (second - first).normalize().rotate(-FRAC_PI_2);
            let centroid = halfway + dir * apothem(sides);
            let mut angle = dir.heading();
            if sides % 2 == 0 {
                angle += PI / sides as f64;
            }
            Polygon::regular(centroid, sides, angle, tol)
        }
        ShapeSpec::Isotoxal { sides, alfa } => {
            let alfa = alfa.radians(config.parameter);
            let side = (first - second).normalize().rotate(alfa / 2.0);
            let gamma = PI * (sides as f64 - 2.0) / (2.0 * sides as f64);
            let beta = gamma - alfa / 2.0;
            let dist = beta.cos() / gamma.cos();
            let centroid = second + side * dist;
            Polygon::isotoxal(centroid, sides, alfa, side.heading(), tol)
        }
        ShapeSpec::Star { sides, m } => {
            // Map the prototype's edge 0 onto the host edge, reversed.
            let proto = Polygon::star(Vector2::ZERO, sides, m, 0.0, tol);
            let p = proto.vertices();
            let theta = (first - second).heading() - (p[1] - p[0]).heading();
            let centroid = second - p[0].rotate(theta);
            Polygon::star(centroid, sides, m, theta, tol)
        }
    }
}
