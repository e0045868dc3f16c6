//! Neighbor graph.
//!
//! Two nodes are direct neighbors when they share an edge midpoint. In
//! Moore mode nodes sharing only a vertex are connected too. Depth `k`
//! widens each node's set to everything within `k` hops.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::config::Neighborhood;
use crate::spatial::{MOORE_OFFSETS, SpatialGrid};
use crate::polygon::Polygon;

/// Sorted, deduplicated adjacency lists.
pub type Adjacency = Vec<Vec<usize>>;

/// Fill every node's `neighbors` and return the direct adjacency used.
pub fn compute_neighbors(
    nodes: &mut [Polygon],
    depth: usize,
    neighborhood: Neighborhood,
    tolerance: f64,
) -> Adjacency {
    let mut direct = edge_adjacency(nodes, tolerance);
    if neighborhood == Neighborhood::Moore {
        add_vertex_adjacency(nodes, &mut direct, tolerance);
    }

    for (i, node) in nodes.iter_mut().enumerate() {
        node.neighbors = within_hops(&direct, i, depth.max(1));
    }
    direct
}

/// Nodes sharing an edge midpoint.
pub fn edge_adjacency(nodes: &[Polygon], tolerance: f64) -> Adjacency {
    let mut grid: SpatialGrid<usize> = SpatialGrid::new(tolerance);
    for (i, node) in nodes.iter().enumerate() {
        for h in node.halfways() {
            grid.insert(h, i);
        }
    }

    let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut link = |a: usize, b: usize| {
        if a != b {
            pairs.insert((a.min(b), a.max(b)));
        }
    };

    // Same-bucket pairs.
    for (_, entries) in grid.cells() {
        for (j, (p, a)) in entries.iter().enumerate() {
            for (q, b) in &entries[j + 1..] {
                if p.approx_eq(*q, tolerance) {
                    link(*a, *b);
                }
            }
        }
    }

    // Cross-bucket pairs.
    for (&(cx, cy), entries) in grid.cells() {
        for (p, a) in entries {
            for (dx, dy) in MOORE_OFFSETS.iter().skip(1) {
                let Some(adjacent) = grid.cell((cx + dx, cy + dy)) else { continue };
                for (q, b) in adjacent {
                    if p.approx_eq(*q, tolerance) {
                        link(*a, *b);
                    }
                }
            }
        }
    }

    let mut adjacency = vec![Vec::new(); nodes.len()];
    for (a, b) in pairs {
        adjacency[a].push(b);
        adjacency[b].push(a);
    }
    for list in &mut adjacency {
        list.sort_unstable();
    }
    adjacency
}

/// Connect nodes sharing a vertex that aren't already edge neighbors.
fn add_vertex_adjacency(nodes: &[Polygon], direct: &mut Adjacency, tolerance: f64) {
    let mut grid: SpatialGrid<usize> = SpatialGrid::new(tolerance);
    let mut groups: Vec<BTreeSet<usize>> = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        for &v in node.vertices() {
            match grid.find(v) {
                Some(&g) => {
                    groups[g].insert(i);
                }
                None => {
                    grid.insert(v, groups.len());
                    groups.push(BTreeSet::from([i]));
                }
            }
        }
    }

    let edge_pairs: HashSet<(usize, usize)> = direct
        .iter()
        .enumerate()
        .flat_map(|(a, list)| list.iter().map(move |&b| (a, b)))
        .collect();

    for group in groups.iter().filter(|g| g.len() >= 2) {
        let members: Vec<usize> = group.iter().copied().collect();
        for (j, &a) in members.iter().enumerate() {
            for &b in &members[j + 1..] {
                if !edge_pairs.contains(&(a, b)) && !direct[a].contains(&b) {
                    direct[a].push(b);
                    direct[b].push(a);
                }
            }
        }
    }
    for list in direct.iter_mut() {
        list.sort_unstable();
    }
}

/// Every node within `depth` hops of `start`, excluding `start`.
pub fn within_hops(adjacency: &Adjacency, start: usize, depth: usize) -> Vec<usize> {
    let mut seen = vec![false; adjacency.len()];
    seen[start] = true;
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut out = Vec::new();

    while let Some((node, d)) = queue.pop_front() {
        if d == depth {
            continue;
        }
        for &next in &adjacency[node] {
            if !seen[next] {
                seen[next] = true;
                out.push(next);
                queue.push_back((next, d + 1));
            }
        }
    }
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use std::f64::consts::FRAC_PI_4;

    fn square_grid(size: i32) -> Vec<Polygon> {
        let mut nodes = Vec::new();
        for y in 0..size {
            for x in 0..size {
                nodes.push(Polygon::regular(Vector2::new(x as f64, y as f64), 4, FRAC_PI_4, 0.01));
            }
        }
        nodes
    }

    #[test]
    fn center_square_has_four_edge_neighbors() {
        let mut nodes = square_grid(3);
        compute_neighbors(&mut nodes, 1, Neighborhood::VonNeumann, 0.01);
        assert_eq!(nodes[4].neighbors, vec![1, 3, 5, 7]);
        assert_eq!(nodes[0].neighbors, vec![1, 3]);
    }

    #[test]
    fn moore_adds_diagonals() {
        let mut nodes = square_grid(3);
        compute_neighbors(&mut nodes, 1, Neighborhood::Moore, 0.01);
        assert_eq!(nodes[4].neighbors, vec![0, 1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(nodes[0].neighbors, vec![1, 3, 4]);
    }

    #[test]
    fn depth_two_reaches_second_ring() {
        let mut nodes = square_grid(3);
        compute_neighbors(&mut nodes, 2, Neighborhood::VonNeumann, 0.01);
        assert_eq!(nodes[0].neighbors, vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        let mut nodes = square_grid(4);
        compute_neighbors(&mut nodes, 1, Neighborhood::VonNeumann, 0.01);
        for (i, node) in nodes.iter().enumerate() {
            for &j in &node.neighbors {
                assert!(nodes[j].neighbors.contains(&i), "{i} -> {j} not mirrored");
            }
        }
    }
}
