//! Generation and puzzle configuration.
//!
//! Everything the generator and level engine read at call time lives here.
//! Nothing is global; callers build a [`Config`] and pass it in.

use serde::{Deserialize, Serialize};

use crate::geometry::DEFAULT_TOLERANCE;

/// Side counts a rule may name. `0` is the placeholder slot.
pub const SUPPORTED_SIDES: [u32; 27] = [
    0, 3, 4, 5, 6, 7, 8, 9, 10, 12, 15, 16, 18, 20, 24, 30, 36, 40, 48, 60, 72, 90, 120, 144,
    180, 240, 360,
];

/// Transform angles (degrees) a rule may name.
pub const SUPPORTED_ANGLES: [u32; 23] = [
    15, 20, 30, 36, 40, 45, 48, 60, 72, 75, 90, 120, 135, 144, 150, 180, 210, 225, 240, 270, 300,
    315, 330,
];

/// Connector weights a tile edge can carry.
pub const CONNECTOR_WEIGHTS: [u8; 3] = [0, 1, 2];

#[inline]
pub fn is_supported_sides(n: u32) -> bool {
    SUPPORTED_SIDES.contains(&n)
}

#[inline]
pub fn is_supported_angle(degrees: f64) -> bool {
    SUPPORTED_ANGLES.iter().any(|&a| (a as f64 - degrees).abs() < 1e-9)
}

/// Which shared features make two nodes neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// Shared edge only.
    #[default]
    VonNeumann,
    /// Shared edge or shared vertex.
    Moore,
}

/// Cosmetic hue parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorParams {
    pub a: f64,
    pub b: f64,
}

impl Default for ColorParams {
    fn default() -> Self {
        Self { a: 180.0, b: 0.0 }
    }
}

/// Hard bounds on transform propagation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationLimits {
    /// Stop once the deduplicated node count exceeds this.
    pub max_nodes: usize,
    /// Stop once this many transform applications have run.
    pub max_iterations: usize,
    /// Wall-clock budget for the propagation phase, in milliseconds.
    pub time_budget_ms: u64,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self { max_nodes: 250, max_iterations: 100, time_budget_ms: 1000 }
    }
}

/// Configuration for generation and level building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coincidence tolerance (ε).
    pub tolerance: f64,
    /// Pixels per unit edge, used by renderers only.
    pub scale: f64,
    /// Number of growth layers.
    pub transform_steps: usize,
    /// Live isotoxal angle parameter, degrees.
    pub parameter: f64,
    pub color: ColorParams,
    pub neighbor_depth: usize,
    pub neighborhood: Neighborhood,
    pub limits: GenerationLimits,
    /// Probabilities for connector weights 0, 1, 2.
    pub weights: [f64; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            scale: 60.0,
            transform_steps: 1,
            parameter: 45.0,
            color: ColorParams::default(),
            neighbor_depth: 1,
            neighborhood: Neighborhood::VonNeumann,
            limits: GenerationLimits::default(),
            weights: [0.45, 0.45, 0.10],
        }
    }
}

impl Config {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance, ..Self::default() }
    }

    pub fn with_steps(transform_steps: usize) -> Self {
        Self { transform_steps, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.tolerance, 0.01);
        assert_eq!(c.limits.max_nodes, 250);
        assert_eq!(c.limits.max_iterations, 100);
        assert_eq!(c.limits.time_budget_ms, 1000);
        assert_eq!(c.weights, [0.45, 0.45, 0.10]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: Config = serde_json::from_str(r#"{"transform_steps": 3, "limits": {"max_nodes": 10}}"#)
            .expect("config should parse");
        assert_eq!(c.transform_steps, 3);
        assert_eq!(c.limits.max_nodes, 10);
        assert_eq!(c.limits.max_iterations, 100);
        assert_eq!(c.tolerance, 0.01);
    }

    #[test]
    fn supported_sets() {
        assert!(is_supported_sides(12));
        assert!(!is_supported_sides(11));
        assert!(is_supported_angle(90.0));
        assert!(!is_supported_angle(91.0));
    }
}
