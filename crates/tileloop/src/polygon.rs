//! Tile shapes.
//!
//! A [`Polygon`] is one tile of a tiling. Its geometry (vertices and edge
//! midpoints) is always derived from the placement parameters and the
//! current turn count; it is recomputed from scratch on every change and
//! never rotated incrementally.
//!
//! Each edge midpoint carries an [`EdgeConnector`] with the puzzle state
//! for that edge. Rotation moves connectors with the geometry; mirroring
//! is the one operation that permutes connector data in place.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::config::ColorParams;
use crate::cycle::canonical_form;
use crate::geometry::{Vector2, circumradius, map_range, point_in_polygon};

const PHI: f64 = 1.618_033_988_749_895;

/// Puzzle state attached to one edge midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeConnector {
    pub position: Vector2,
    /// 0 = no pipe, 1 and 2 = pipe variants.
    pub weight: u8,
    /// Set by the level's solved check.
    pub matched: bool,
}

impl EdgeConnector {
    fn at(position: Vector2) -> Self {
        Self { position, weight: 0, matched: false }
    }
}

/// Shape variant and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Unit-edge regular polygon.
    Regular,
    /// `{n.m}` star: `2n` vertices on two radii.
    Star { m: u32 },
    /// Isotoxal polygon with point angle `alfa` (radians): `2n` vertices.
    Isotoxal { alfa: f64 },
    /// Dual face. `base` holds the vertices at turn 0, ordered around the
    /// centroid.
    Dual { base: Vec<Vector2> },
}

/// Canonical connector class of a tile, plus the offset used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileClass {
    /// `"{n}/{canonical weights}"`, empty until a level assigns it.
    pub label: String,
    pub turns: usize,
    pub mirrored: bool,
}

/// One tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    shape: Shape,
    centroid: Vector2,
    sides: u32,
    angle: f64,
    turns: i32,
    rotation: f64,
    mirrored: bool,
    vertices: Vec<Vector2>,
    edges: Vec<EdgeConnector>,
    tolerance: f64,
    pub tile: TileClass,
    /// Indices of neighboring nodes in the owning tiling.
    pub neighbors: Vec<usize>,
}

impl Polygon {
    fn build(shape: Shape, centroid: Vector2, sides: u32, angle: f64, tolerance: f64) -> Self {
        let mut polygon = Self {
            shape,
            centroid: centroid.snapped(tolerance),
            sides,
            angle,
            turns: 0,
            rotation: 0.0,
            mirrored: false,
            vertices: Vec::new(),
            edges: Vec::new(),
            tolerance,
            tile: TileClass::default(),
            neighbors: Vec::new(),
        };
        polygon.recompute();
        polygon
    }

    pub fn regular(centroid: Vector2, sides: u32, angle: f64, tolerance: f64) -> Self {
        Self::build(Shape::Regular, centroid, sides, angle, tolerance)
    }

    pub fn star(centroid: Vector2, sides: u32, m: u32, angle: f64, tolerance: f64) -> Self {
        Self::build(Shape::Star { m }, centroid, sides, angle, tolerance)
    }

    pub fn isotoxal(centroid: Vector2, sides: u32, alfa: f64, angle: f64, tolerance: f64) -> Self {
        Self::build(Shape::Isotoxal { alfa }, centroid, sides, angle, tolerance)
    }

    /// Dual face with the given corners, sorted by angle around `centroid`.
    pub fn dual(centroid: Vector2, mut corners: Vec<Vector2>, tolerance: f64) -> Self {
        corners.sort_by(|a, b| {
            let ha = (*a - centroid).heading().rem_euclid(TAU);
            let hb = (*b - centroid).heading().rem_euclid(TAU);
            ha.total_cmp(&hb)
        });
        let sides = corners.len() as u32;
        Self::build(Shape::Dual { base: corners }, centroid, sides, 0.0, tolerance)
    }

    /// Same shape placed at a new centroid and orientation, turn count reset.
    pub fn with_placement(&self, centroid: Vector2, angle: f64) -> Self {
        let shape = match &self.shape {
            Shape::Dual { base } => {
                let delta = angle - self.angle;
                Shape::Dual {
                    base: base
                        .iter()
                        .map(|v| centroid + (*v - self.centroid).rotate(delta))
                        .collect(),
                }
            }
            other => other.clone(),
        };
        Self::build(shape, centroid, self.sides, angle, self.tolerance)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn centroid(&self) -> Vector2 {
        self.centroid
    }

    /// Side count `n`. Star and isotoxal shapes have `2n` vertices.
    #[inline]
    pub fn sides(&self) -> u32 {
        self.sides
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn turns(&self) -> i32 {
        self.turns
    }

    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    #[inline]
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    #[inline]
    pub fn vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    #[inline]
    pub fn edges(&self) -> &[EdgeConnector] {
        &self.edges
    }

    pub fn halfways(&self) -> impl Iterator<Item = Vector2> + '_ {
        self.edges.iter().map(|e| e.position)
    }

    /// Connector weights in edge order.
    pub fn weights(&self) -> Vec<u8> {
        self.edges.iter().map(|e| e.weight).collect()
    }

    pub fn set_weight(&mut self, edge: usize, weight: u8) {
        if let Some(e) = self.edges.get_mut(edge) {
            e.weight = weight;
        }
    }

    pub fn set_matched(&mut self, edge: usize, matched: bool) {
        if let Some(e) = self.edges.get_mut(edge) {
            e.matched = matched;
        }
    }

    pub fn has_connector(&self) -> bool {
        self.edges.iter().any(|e| e.weight > 0)
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    /// Turn the tile by `turns` steps of `2π/n`.
    ///
    /// The step direction flips while the tile is mirrored.
    pub fn rotate(&mut self, turns: i32) {
        let signed = if self.mirrored { -turns } else { turns };
        self.turns += signed;
        self.rotation = self.turns as f64 * TAU / self.sides.max(1) as f64;
        self.recompute();
    }

    /// Restore a stored turn count and mirror flag without touching
    /// connector data.
    pub fn set_orientation(&mut self, turns: i32, mirrored: bool) {
        self.turns = turns;
        self.mirrored = mirrored;
        self.rotation = self.turns as f64 * TAU / self.sides.max(1) as f64;
        self.recompute();
    }

    /// Flip the tile across the axis through edge 0.
    ///
    /// Connector `i` moves to slot `(n - i) mod n`; positions are unchanged.
    pub fn mirror(&mut self) {
        let n = self.edges.len();
        let old: Vec<(u8, bool)> = self.edges.iter().map(|e| (e.weight, e.matched)).collect();
        for (i, edge) in self.edges.iter_mut().enumerate() {
            let (weight, matched) = old[(n - i) % n];
            edge.weight = weight;
            edge.matched = matched;
        }
        self.mirrored = !self.mirrored;
    }

    pub fn contains_point(&self, p: Vector2) -> bool {
        point_in_polygon(p, &self.vertices)
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    fn recompute(&mut self) {
        let tol = self.tolerance;
        let n = self.sides as f64;
        let c = self.centroid;
        let phase = self.angle + self.rotation;

        let raw: Vec<Vector2> = match &self.shape {
            Shape::Regular => {
                let radius = circumradius(self.sides);
                (0..self.sides)
                    .map(|i| Vector2::from_polar(c, radius, i as f64 * TAU / n + phase))
                    .collect()
            }
            Shape::Star { m } => {
                let gamma = PI / n;
                let alpha = (*m as f64 - 1.0) * gamma;
                let outer = alpha.cos() / gamma.sin();
                let inner = outer * gamma.cos() - alpha.sin();
                (0..self.sides)
                    .flat_map(|i| {
                        let base = 2.0 * gamma * i as f64 + phase;
                        [
                            Vector2::from_polar(c, outer, base),
                            Vector2::from_polar(c, inner, base + gamma),
                        ]
                    })
                    .collect()
            }
            Shape::Isotoxal { alfa } => {
                let gamma = PI * (n - 2.0) / (2.0 * n);
                let beta = gamma - alfa / 2.0;
                let outer = beta.cos() / gamma.cos();
                let inner = gamma.tan() * beta.cos() - beta.sin();
                (0..self.sides)
                    .flat_map(|i| {
                        let i = i as f64;
                        [
                            Vector2::from_polar(c, outer, i * TAU / n + phase + PI),
                            Vector2::from_polar(c, inner, (i + 0.5) * TAU / n + phase + PI),
                        ]
                    })
                    .collect()
            }
            Shape::Dual { base } => {
                let len = base.len().max(1) as i32;
                let shift = self.turns.rem_euclid(len) as usize;
                base.iter().cycle().skip(shift).take(base.len()).copied().collect()
            }
        };

        self.vertices = raw.into_iter().map(|v| v.snapped(tol)).collect();

        let count = self.vertices.len();
        let mut edges = Vec::with_capacity(count);
        for i in 0..count {
            let mid = self.vertices[i].midpoint(self.vertices[(i + 1) % count]).snapped(tol);
            let mut edge = self.edges.get(i).copied().unwrap_or(EdgeConnector::at(mid));
            edge.position = mid;
            edges.push(edge);
        }
        self.edges = edges;
    }

    // ------------------------------------------------------------------
    // Cosmetics
    // ------------------------------------------------------------------

    /// Fill hue in degrees.
    pub fn hue(&self, color: &ColorParams) -> f64 {
        let count = self.vertices.len() as f64;
        match self.shape {
            Shape::Regular => map_range(count.ln(), 3f64.ln(), 40f64.ln(), 0.0, 300.0),
            Shape::Star { .. } | Shape::Isotoxal { .. } => {
                map_range(count / 2.0, 3.0, 12.0, 300.0, 0.0) + 25.0
            }
            Shape::Dual { .. } => self.angles_hue(color),
        }
    }

    /// Interior angles in whole degrees, one per vertex.
    pub fn interior_angles(&self) -> Vec<i64> {
        let v = &self.vertices;
        let n = v.len();
        (0..n)
            .map(|i| {
                let prev = v[(i + n - 1) % n] - v[i];
                let next = v[(i + 1) % n] - v[i];
                let cos = (prev.dot(next) / (prev.mag() * next.mag())).clamp(-1.0, 1.0);
                cos.acos().to_degrees().round() as i64
            })
            .collect()
    }

    fn angles_hue(&self, color: &ColorParams) -> f64 {
        let canonical = canonical_form(&self.interior_angles()).cycle;
        let hash = canonical
            .iter()
            .fold(0.0, |h, &a| (h * PHI + a as f64 * std::f64::consts::SQRT_2) % 1447.0);
        let rotated = (hash % 360.0 + color.a) % 360.0;
        let displaced =
            rotated + color.b * self.vertices.len() as f64 * rotated.to_radians().sin();
        (displaced + 360.0) % 360.0
    }

    /// Read-only descriptor for renderers.
    pub fn render_node(&self, id: String, color: &ColorParams) -> RenderNode {
        let degrees = self.turns as f64 * 360.0 / self.sides.max(1) as f64;
        let mut transform = format!("rotate({degrees}deg)");
        if self.mirrored {
            transform.push_str(" scaleX(-1)");
        }
        RenderNode {
            id,
            centroid: self.centroid,
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            turns: self.turns,
            mirrored: self.mirrored,
            transform,
            tile_type: self.tile.label.clone(),
            hue: self.hue(color),
        }
    }
}

/// What a renderer needs to draw one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub centroid: Vector2,
    pub vertices: Vec<Vector2>,
    pub edges: Vec<EdgeConnector>,
    pub turns: i32,
    pub mirrored: bool,
    /// SVG-style transform for a shared sprite.
    pub transform: String,
    pub tile_type: String,
    pub hue: f64,
}

// ============================================================================
// TESTS
// ============================================================================
