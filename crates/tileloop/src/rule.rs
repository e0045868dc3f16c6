//! Rule-string parser.
//!
//! A rule is a seed phase followed by transform phases, separated by `/`:
//!
//! ```text
//! 4-4-0,4/r90/m(v2)
//! ^^^^^^^^ seed: layers split by '-', shapes within a layer by ','
//!          ^^^ ^^^^^ transforms, applied in order
//! ```
//!
//! Shapes: `n` regular (`n'` flipped core), `n(alfa)` isotoxal (`alfa` in
//! degrees or `a` for the live parameter), `{n.m}` star, `0` placeholder.
//! Transforms: `m<deg>`, `r<deg>`, `m(anchor)`, `r(anchor)[deg]`,
//! `t(anchor)`, where an anchor is `c`, `h` or `v` plus a 1-based index.
//! A trailing `*` asks for the dual tiling.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::config::{is_supported_angle, is_supported_sides};

/// Malformed rule string. Every variant carries the offending fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("empty rule")]
    EmptyRule,
    #[error("unbalanced brackets in `{token}`")]
    UnbalancedBrackets { token: String },
    #[error("unsupported side count {sides} in `{token}`")]
    UnsupportedSides { token: String, sides: u32 },
    #[error("invalid number in `{token}`")]
    InvalidNumber { token: String },
    #[error("invalid transform `{token}`")]
    InvalidTransform { token: String },
    #[error("invalid anchor `{token}`")]
    InvalidAnchor { token: String },
}

/// Point angle of an isotoxal shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IsotoxalAngle {
    /// Fixed angle in degrees.
    Degrees(f64),
    /// Follows `Config::parameter`.
    Live,
}

impl IsotoxalAngle {
    /// Angle in radians, given the live parameter in degrees.
    pub fn radians(self, parameter: f64) -> f64 {
        match self {
            IsotoxalAngle::Degrees(d) => d.to_radians(),
            IsotoxalAngle::Live => parameter.to_radians(),
        }
    }
}

/// One seed shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeSpec {
    Regular { sides: u32, special: bool },
    Isotoxal { sides: u32, alfa: IsotoxalAngle },
    Star { sides: u32, m: u32 },
}

impl ShapeSpec {
    pub fn sides(&self) -> u32 {
        match *self {
            ShapeSpec::Regular { sides, .. }
            | ShapeSpec::Isotoxal { sides, .. }
            | ShapeSpec::Star { sides, .. } => sides,
        }
    }

    /// A `0` slot: skips one free edge during seed placement.
    pub fn is_placeholder(&self) -> bool {
        self.sides() == 0
    }
}

impl fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ShapeSpec::Regular { sides, special } => {
                write!(f, "{sides}")?;
                if special {
                    f.write_str("'")?;
                }
                Ok(())
            }
            ShapeSpec::Isotoxal { sides, alfa: IsotoxalAngle::Degrees(d) } => write!(f, "{sides}({d})"),
            ShapeSpec::Isotoxal { sides, alfa: IsotoxalAngle::Live } => write!(f, "{sides}(a)"),
            ShapeSpec::Star { sides, m } => write!(f, "{{{sides}.{m}}}"),
        }
    }
}

/// Which feature set an anchor indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    Centroid,
    Halfway,
    Vertex,
}

impl AnchorKind {
    fn letter(self) -> char {
        match self {
            AnchorKind::Centroid => 'c',
            AnchorKind::Halfway => 'h',
            AnchorKind::Vertex => 'v',
        }
    }
}

/// `{c|h|v}<index>`, index 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorRef {
    pub kind: AnchorKind,
    pub index: usize,
}

impl fmt::Display for AnchorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Mirror,
    Rotate,
    Translate,
}

/// One transform phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub kind: TransformKind,
    /// `None` for the by-angle forms, which act around the origin.
    pub anchor: Option<AnchorRef>,
    /// Radians.
    pub angle: f64,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.kind {
            TransformKind::Mirror => 'm',
            TransformKind::Rotate => 'r',
            TransformKind::Translate => 't',
        };
        let degrees = self.angle.to_degrees().round();
        match self.anchor {
            None => write!(f, "{letter}{degrees}"),
            Some(anchor) if self.kind == TransformKind::Rotate && degrees != 180.0 => {
                write!(f, "{letter}({anchor})[{degrees}]")
            }
            Some(anchor) => write!(f, "{letter}({anchor})"),
        }
    }
}

/// A parsed rule string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRule {
    /// The string as given.
    pub source: String,
    /// Seed layers; layer 0 holds the core shape first.
    pub seed: Vec<Vec<ShapeSpec>>,
    pub transforms: Vec<Transform>,
    pub dual: bool,
    /// Decorative islamic rendering requested.
    pub islamic: bool,
}

impl ParsedRule {
    /// First shape of the first layer.
    pub fn core(&self) -> Option<&ShapeSpec> {
        self.seed.first().and_then(|layer| layer.first())
    }
}

impl fmt::Display for ParsedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.seed.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            for (j, shape) in layer.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{shape}")?;
            }
        }
        for t in &self.transforms {
            write!(f, "/{t}")?;
        }
        if self.dual {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl FromStr for ParsedRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rule(s)
    }
}

/// Parse a rule string.
pub fn parse_rule(rule: &str) -> Result<ParsedRule, RuleError> {
    let source = rule.trim();
    let (body, dual) = match source.strip_suffix('*') {
        Some(body) => (body, true),
        None => (source, false),
    };
    let islamic = !dual && body.contains('i');
    let body: String = body.chars().filter(|c| *c != 'i' && !c.is_whitespace()).collect();
    if body.is_empty() {
        return Err(RuleError::EmptyRule);
    }

    let mut phases = body.split('/');
    let seed_phase = phases.next().unwrap_or_default();

    let seed = seed_phase
        .split('-')
        .map(|layer| layer.split(',').map(parse_shape).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    let transforms = phases.map(parse_transform).collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedRule { source: source.to_string(), seed, transforms, dual, islamic })
}

fn count(s: &str, c: char) -> usize {
    s.chars().filter(|&x| x == c).count()
}

fn unbalanced(token: &str) -> RuleError {
    RuleError::UnbalancedBrackets { token: token.to_string() }
}

fn parse_int(text: &str, token: &str) -> Result<u32, RuleError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| RuleError::InvalidNumber { token: token.to_string() })
}

fn check_sides(sides: u32, token: &str) -> Result<u32, RuleError> {
    if is_supported_sides(sides) {
        Ok(sides)
    } else {
        Err(RuleError::UnsupportedSides { token: token.to_string(), sides })
    }
}

fn parse_shape(token: &str) -> Result<ShapeSpec, RuleError> {
    if count(token, '(') != count(token, ')') {
        return Err(unbalanced(token));
    }
    let braces = count(token, '{');
    if braces != count(token, '}') || braces != count(token, '.') {
        return Err(unbalanced(token));
    }

    if let Some((n, rest)) = token.split_once('(') {
        let inner = rest.split(')').next().unwrap_or_default().trim();
        let sides = check_sides(parse_int(n, token)?, token)?;
        let alfa = if inner == "a" {
            IsotoxalAngle::Live
        } else {
            IsotoxalAngle::Degrees(parse_int(inner, token)? as f64)
        };
        return Ok(ShapeSpec::Isotoxal { sides, alfa });
    }

    if let Some(rest) = token.strip_prefix('{') {
        let inner = rest.split('}').next().unwrap_or_default();
        let (n, m) = inner.split_once('.').ok_or_else(|| unbalanced(token))?;
        let sides = check_sides(parse_int(n, token)?, token)?;
        let m = parse_int(m, token)?;
        return Ok(ShapeSpec::Star { sides, m });
    }

    let special = token.contains('\'');
    let digits: String = token.chars().filter(|c| *c != '\'').collect();
    let sides = check_sides(parse_int(&digits, token)?, token)?;
    Ok(ShapeSpec::Regular { sides, special })
}

/// Degrees to radians, substituting 180° for unsupported angles.
fn checked_angle(degrees: Option<f64>, token: &str) -> f64 {
    match degrees {
        Some(d) if is_supported_angle(d) => d.to_radians(),
        other => {
            warn!(token, angle = ?other, "unsupported transform angle, using 180");
            PI
        }
    }
}

fn parse_anchor(spec: &str, token: &str) -> Result<AnchorRef, RuleError> {
    let invalid = || RuleError::InvalidAnchor { token: token.to_string() };
    let mut chars = spec.trim().chars();
    let kind = match chars.next() {
        Some('c') => AnchorKind::Centroid,
        Some('h') => AnchorKind::Halfway,
        Some('v') => AnchorKind::Vertex,
        _ => return Err(invalid()),
    };
    let index: usize = chars.as_str().parse().map_err(|_| invalid())?;
    if index == 0 {
        return Err(invalid());
    }
    Ok(AnchorRef { kind, index })
}

fn parse_transform(token: &str) -> Result<Transform, RuleError> {
    if count(token, '(') != count(token, ')') || count(token, '[') != count(token, ']') {
        return Err(unbalanced(token));
    }
    let invalid = || RuleError::InvalidTransform { token: token.to_string() };
    let kind = match token.chars().next() {
        Some('m') => TransformKind::Mirror,
        Some('r') => TransformKind::Rotate,
        Some('t') => TransformKind::Translate,
        _ => return Err(invalid()),
    };

    if let Some((_, rest)) = token.split_once('(') {
        let (spec, tail) = rest.split_once(')').ok_or_else(invalid)?;
        let anchor = parse_anchor(spec, token)?;
        let degrees = match tail.split_once('[') {
            Some((_, bracket)) => bracket.split(']').next().and_then(|d| d.trim().parse::<f64>().ok()),
            None => Some(180.0),
        };
        return Ok(Transform { kind, anchor: Some(anchor), angle: checked_angle(degrees, token) });
    }

    if kind == TransformKind::Translate {
        return Err(invalid());
    }
    let degrees = token[1..].trim().parse::<f64>().ok();
    Ok(Transform { kind, anchor: None, angle: checked_angle(degrees, token) })
}
