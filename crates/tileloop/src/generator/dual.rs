//! Dual tiling construction.
//!
//! Every interior vertex of the primal tiling becomes a dual face whose
//! corners are the centroids of the polygons meeting there.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use crate::geometry::{Vector2, angle_between};
use crate::polygon::Polygon;
use crate::spatial::{SpatialGrid, dedupe_points};

/// Dual faces of `nodes`.
///
/// Vertices touched by fewer than 3 polygons, or by more distinct incident
/// edges than polygons (an open boundary vertex), produce no face.
pub fn dual_nodes(nodes: &[Polygon], tolerance: f64) -> Vec<Polygon> {
    let mut owners: SpatialGrid<usize> = SpatialGrid::new(tolerance);
    let mut all_vertices = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        for &v in node.vertices() {
            owners.insert(v, i);
            all_vertices.push(v);
        }
    }

    let mut faces = Vec::new();
    for vertex in dedupe_points(&all_vertices, tolerance) {
        let mut around: Vec<usize> = owners.near(vertex).copied().collect();
        around.sort_unstable();
        around.dedup();
        if around.len() < 3 {
            continue;
        }

        let incident = incident_halfways(nodes, &around, vertex, tolerance);
        if around.len() < incident {
            continue;
        }

        let corners: Vec<Vector2> = around.iter().map(|&i| nodes[i].centroid()).collect();
        faces.push(Polygon::dual(vertex, corners, tolerance));
    }

    debug!(primal = nodes.len(), dual = faces.len(), "dual computed");
    faces
}

/// Distinct edge midpoints of `around` whose edge runs through `vertex`.
fn incident_halfways(nodes: &[Polygon], around: &[usize], vertex: Vector2, tolerance: f64) -> usize {
    let mut found = Vec::new();
    for &i in around {
        let node = &nodes[i];
        for h in node.halfways() {
            let angle = angle_between(node.centroid(), h, vertex);
            if (angle - FRAC_PI_2).abs() < tolerance || (angle + FRAC_PI_2).abs() < tolerance {
                found.push(h);
            }
        }
    }
    dedupe_points(&found, tolerance).len()
}
