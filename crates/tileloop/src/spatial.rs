//! Uniform-grid spatial hash for tolerance coincidence queries.
//!
//! Points are bucketed into square cells of side `2ε`. A query checks its
//! own cell plus the eight surrounding cells, which always covers the
//! `ε`-box around the query point, then applies the exact tolerance test.

use std::collections::HashMap;

use crate::geometry::Vector2;

/// Integer cell coordinate.
pub type CellKey = (i64, i64);

/// The query cell and its 8 neighbors.
pub const MOORE_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Spatial hash of positioned items.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    tolerance: f64,
    cells: HashMap<CellKey, Vec<(Vector2, T)>>,
    len: usize,
}

impl<T> SpatialGrid<T> {
    pub fn new(tolerance: f64) -> Self {
        Self {
            cell_size: (2.0 * tolerance).max(f64::EPSILON),
            tolerance,
            cells: HashMap::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Convert a point to a grid cell coordinate.
    #[inline]
    pub fn key(&self, p: Vector2) -> CellKey {
        ((p.x / self.cell_size).floor() as i64, (p.y / self.cell_size).floor() as i64)
    }

    pub fn insert(&mut self, p: Vector2, item: T) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push((p, item));
        self.len += 1;
    }

    /// Items in the 9 cells around `p`, unfiltered.
    pub fn neighborhood(&self, p: Vector2) -> impl Iterator<Item = &(Vector2, T)> + '_ {
        let (cx, cy) = self.key(p);
        MOORE_OFFSETS
            .iter()
            .filter_map(move |(dx, dy)| self.cells.get(&(cx + dx, cy + dy)))
            .flatten()
    }

    /// Items whose position is tolerance-equal to `p`.
    pub fn near(&self, p: Vector2) -> impl Iterator<Item = &T> + '_ {
        let tol = self.tolerance;
        self.neighborhood(p)
            .filter(move |(q, _)| q.approx_eq(p, tol))
            .map(|(_, item)| item)
    }

    /// First item tolerance-equal to `p`.
    pub fn find(&self, p: Vector2) -> Option<&T> {
        self.near(p).next()
    }

    /// Non-empty cells.
    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &Vec<(Vector2, T)>)> {
        self.cells.iter()
    }

    pub fn cell(&self, key: CellKey) -> Option<&Vec<(Vector2, T)>> {
        self.cells.get(&key)
    }
}

/// Remove tolerance-duplicates and non-finite points, keeping first
/// occurrences in input order.
pub fn dedupe_points(points: &[Vector2], tolerance: f64) -> Vec<Vector2> {
    let mut grid = SpatialGrid::new(tolerance);
    let mut out = Vec::new();
    for &p in points {
        if !p.is_finite() || grid.find(p).is_some() {
            continue;
        }
        grid.insert(p, ());
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_point_across_cell_boundary() {
        let mut grid = SpatialGrid::new(0.01);
        // 0.0199 and 0.0201 land in different cells of size 0.02.
        grid.insert(Vector2::new(0.0199, 0.0), 1);
        assert_eq!(grid.find(Vector2::new(0.0201, 0.0)), Some(&1));
        assert_eq!(grid.find(Vector2::new(0.05, 0.0)), None);
    }

    #[test]
    fn negative_coordinates_bucket_correctly() {
        let mut grid = SpatialGrid::new(0.01);
        grid.insert(Vector2::new(-0.001, -0.001), "a");
        assert_eq!(grid.find(Vector2::new(0.001, 0.001)), Some(&"a"));
    }

    #[test]
    fn dedupe_keeps_first_and_drops_nan() {
        let pts = [
            Vector2::new(1.0, 1.0),
            Vector2::new(1.004, 0.998),
            Vector2::new(f64::NAN, 0.0),
            Vector2::new(2.0, 1.0),
        ];
        let out = dedupe_points(&pts, 0.01);
        assert_eq!(out, vec![Vector2::new(1.0, 1.0), Vector2::new(2.0, 1.0)]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let pts: Vec<Vector2> = (0..50)
            .map(|i| Vector2::new((i % 7) as f64 * 0.5 + (i as f64) * 1e-4, (i % 3) as f64))
            .collect();
        let once = dedupe_points(&pts, 0.01);
        let twice = dedupe_points(&once, 0.01);
        assert_eq!(once.len(), twice.len());
    }
}
