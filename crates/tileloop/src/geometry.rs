//! Core geometry types for tileloop.
//!
//! Every coincidence test in the crate goes through a tolerance predicate;
//! two points are never compared with `==`.
//!
//! ## Rust Lesson #3: Operator overloading
//!
//! Implementing `std::ops::Add` for `Vector2` lets us write `a + b`
//! instead of `a.add(b)`. Because `Vector2` is `Copy`, the operands are
//! copied into the call and nothing is moved out from under the caller.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

/// Default coincidence tolerance (ε) for points in tiling space.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Point at `radius` from `center` in direction `angle`.
    #[inline]
    pub fn from_polar(center: Vector2, radius: f64, angle: f64) -> Self {
        Self::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        )
    }

    #[inline]
    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Length of the vector.
    #[inline]
    pub fn mag(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let m = self.mag();
        if m == 0.0 { self } else { Self::new(self.x / m, self.y / m) }
    }

    /// Angle of the vector measured from the +x axis, in (-π, π].
    #[inline]
    pub fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }

    #[inline]
    pub fn distance(self, other: Vector2) -> f64 {
        (self - other).mag()
    }

    #[inline]
    pub fn midpoint(self, other: Vector2) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Rotate around the origin.
    ///
    /// Rebuilds the vector from heading and magnitude, folding the heading
    /// back towards (-π, π] on every call so repeated rotations don't drift.
    pub fn rotate(self, angle: f64) -> Self {
        let alpha = (self.heading() + angle + PI) % TAU - PI;
        let m = self.mag();
        Self::new(m * alpha.cos(), m * alpha.sin())
    }

    /// Rotate around `center`.
    #[inline]
    pub fn rotate_around(self, center: Vector2, angle: f64) -> Self {
        center + (self - center).rotate(angle)
    }

    /// Reflect across the line through the origin at `axis_angle`.
    pub fn mirror(self, axis_angle: f64) -> Self {
        let d = Self::from_angle(axis_angle);
        let proj = 2.0 * self.dot(d);
        Self::new(proj * d.x - self.x, proj * d.y - self.y)
    }

    /// Reflect across the line through `origin` with direction `dir`.
    pub fn mirror_across_line(self, origin: Vector2, dir: Vector2) -> Self {
        let d = dir.normalize();
        let rel = self - origin;
        let proj = 2.0 * rel.dot(d);
        origin + Self::new(proj * d.x - rel.x, proj * d.y - rel.y)
    }

    /// Tolerance equality on both coordinates.
    #[inline]
    pub fn approx_eq(self, other: Vector2, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }

    /// Coordinates within `tolerance` of zero become exactly `0.0`.
    #[inline]
    pub fn snapped(self, tolerance: f64) -> Self {
        Self::new(snap(self.x, tolerance), snap(self.y, tolerance))
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    #[inline]
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    #[inline]
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    #[inline]
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    #[inline]
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

#[inline]
pub fn snap(value: f64, tolerance: f64) -> f64 {
    if value.abs() < tolerance { 0.0 } else { value }
}

/// Distance from the centroid of a unit-edge regular n-gon to its edges.
#[inline]
pub fn apothem(n: u32) -> f64 {
    0.5 / (PI / n as f64).tan()
}

/// Circumradius of a unit-edge regular n-gon.
#[inline]
pub fn circumradius(n: u32) -> f64 {
    0.5 / (PI / n as f64).sin()
}

/// Angle of `p` measured clockwise from +y, in [0, 2π).
pub fn clockwise_angle(p: Vector2, tolerance: f64) -> f64 {
    if p.x.abs() < tolerance {
        return if p.y > 0.0 { 0.0 } else { PI };
    }
    let angle = FRAC_PI_2 - p.y.atan2(p.x);
    if angle < 0.0 { angle + TAU } else { angle }
}

/// Angle at `b` between `a` and `c`, folded modulo π (sign preserved).
pub fn angle_between(a: Vector2, b: Vector2, c: Vector2) -> f64 {
    ((a - b).heading() - (c - b).heading() + PI) % PI
}

/// Linear remap of `value` from `[a, b]` to `[c, d]`.
#[inline]
pub fn map_range(value: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    c + (value - a) * (d - c) / (b - a)
}

/// Sort points by clockwise angle from the origin, then by distance.
///
/// Points whose angles differ by less than `tolerance` share an angular
/// group; each group is ordered by distance from the origin.
pub fn sort_by_angle_and_distance(points: &mut [Vector2], tolerance: f64) {
    sort_by_key_point(points, |p| *p, tolerance);
}

/// Same ordering as [`sort_by_angle_and_distance`], for any item with a
/// position.
pub fn sort_by_key_point<T, F>(items: &mut [T], position: F, tolerance: f64)
where
    F: Fn(&T) -> Vector2,
{
    items.sort_by(|a, b| {
        clockwise_angle(position(a), tolerance).total_cmp(&clockwise_angle(position(b), tolerance))
    });

    let mut start = 0;
    while start < items.len() {
        let head = clockwise_angle(position(&items[start]), tolerance);
        let mut end = start + 1;
        while end < items.len()
            && clockwise_angle(position(&items[end]), tolerance) - head < tolerance
        {
            end += 1;
        }
        items[start..end].sort_by(|a, b| position(a).mag().total_cmp(&position(b).mag()));
        start = end;
    }
}

/// Even-odd ray cast.
pub fn point_in_polygon(p: Vector2, vertices: &[Vector2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y)
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn rotate_quarter_turn() {
        let v = Vector2::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert!(v.approx_eq(Vector2::new(0.0, 1.0), EPS), "got {v:?}");
    }

    #[test]
    fn rotate_preserves_tolerance_equality() {
        let a = Vector2::new(1.234, -0.5);
        let b = Vector2::new(1.238, -0.503);
        assert!(a.approx_eq(b, DEFAULT_TOLERANCE));
        for k in 0..24 {
            let phi = k as f64 * PI / 12.0 + 0.1;
            assert!(
                a.rotate(phi).approx_eq(b.rotate(phi), DEFAULT_TOLERANCE),
                "rotation by {phi} broke tolerance equality"
            );
        }
    }

    #[test]
    fn rotate_many_times_does_not_drift() {
        let start = Vector2::new(0.3, 0.7);
        let mut v = start;
        for _ in 0..1200 {
            v = v.rotate(PI / 6.0);
        }
        assert!(v.approx_eq(start, 1e-6), "drifted to {v:?}");
    }

    #[test]
    fn mirror_across_x_axis() {
        let v = Vector2::new(2.0, 3.0).mirror(0.0);
        assert!(v.approx_eq(Vector2::new(2.0, -3.0), EPS));
    }

    #[test]
    fn mirror_across_diagonal_swaps_coordinates() {
        let v = Vector2::new(2.0, 3.0).mirror(PI / 4.0);
        assert!(v.approx_eq(Vector2::new(3.0, 2.0), EPS));
    }

    #[test]
    fn mirror_across_line_through_point() {
        let v = Vector2::new(0.0, 2.0).mirror_across_line(Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0));
        assert!(v.approx_eq(Vector2::ZERO, EPS));
    }

    #[test]
    fn clockwise_angle_quadrants() {
        let tol = DEFAULT_TOLERANCE;
        assert_eq!(clockwise_angle(Vector2::new(0.0, 1.0), tol), 0.0);
        assert!((clockwise_angle(Vector2::new(1.0, 0.0), tol) - FRAC_PI_2).abs() < EPS);
        assert_eq!(clockwise_angle(Vector2::new(0.0, -1.0), tol), PI);
        assert!((clockwise_angle(Vector2::new(-1.0, 0.0), tol) - 1.5 * PI).abs() < EPS);
    }

    #[test]
    fn sort_orders_by_angle_then_distance() {
        let mut pts = vec![
            Vector2::new(-1.0, 0.0),
            Vector2::new(0.0, 2.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ];
        sort_by_angle_and_distance(&mut pts, DEFAULT_TOLERANCE);
        assert_eq!(
            pts,
            vec![
                Vector2::new(0.0, 1.0),
                Vector2::new(0.0, 2.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(-1.0, 0.0),
            ]
        );
    }

    #[test]
    fn snapping_removes_noise() {
        let v = Vector2::new(1e-12, -0.004).snapped(DEFAULT_TOLERANCE);
        assert_eq!(v, Vector2::ZERO);
        assert!(v.y.is_sign_positive(), "snapped value must not be -0");
    }

    #[test]
    fn apothem_of_square_is_half() {
        assert!((apothem(4) - 0.5).abs() < EPS);
        assert!((circumradius(6) - 1.0).abs() < EPS);
    }

    #[test]
    fn angle_between_right_angle() {
        let a = angle_between(Vector2::new(0.0, 1.0), Vector2::ZERO, Vector2::new(1.0, 0.0));
        assert!((a.abs() - FRAC_PI_2).abs() < EPS, "got {a}");
    }

    #[test]
    fn point_in_square() {
        let sq = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        assert!(point_in_polygon(Vector2::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon(Vector2::new(1.5, 0.5), &sq));
    }
}
