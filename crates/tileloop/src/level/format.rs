//! Level export / import document.
//!
//! ```json
//! {
//!   "metadata":   { "name": "...", "description": "...", "created": "2026-01-01T00:00:00Z" },
//!   "tiling":     { "rulestring": "4-4-0,4/r90/m(v2)", "transformSteps": 2, "name": "square" },
//!   "dimensions": { "width": 800, "height": 600 },
//!   "tiles": [
//!     { "id": "tile-0-0.000-0.000", "position": { "x": 0, "y": 0 },
//!       "connections": [ { "connections": 1 }, { "connections": 0 } ],
//!       "turns": 2, "mirrored": false }
//!   ]
//! }
//! ```
//!
//! `turns` and `mirrored` are optional. When present they restore each
//! tile's orientation on import so edge `i` lands where it was exported.
//! The optional top-level `effects` array holds the level's linked tiles,
//! `{ "owner": 3, "target": 7, "kind": "rotate", "turns": 2 }`, with
//! `owner` and `target` indexing `tiles`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog;
use crate::config::Config;
use crate::generator::{GenerateError, TilingGenerator};
use crate::tiling::tile_id;

use super::{Effect, Level};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("`{0}` must be an array")]
    NotAnArray(&'static str),
    #[error("tile {index}: {reason}")]
    InvalidTile { index: usize, reason: String },
    #[error("effect {index}: {reason}")]
    InvalidEffect { index: usize, reason: String },
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

// ============================================================================
// Document types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    pub metadata: Metadata,
    pub tiling: TilingInfo,
    pub dimensions: Dimensions,
    pub tiles: Vec<TileRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilingInfo {
    pub rulestring: String,
    #[serde(default = "default_steps")]
    pub transform_steps: usize,
    #[serde(default)]
    pub name: String,
}

fn default_steps() -> usize {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub connections: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: String,
    pub position: Position,
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrored: Option<bool>,
}

/// Which path [`import_level`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Tile data applied onto the regenerated tiling.
    Applied,
    /// Tile count mismatch: the level was rebuilt from the rule alone.
    Reconstructed,
}

/// Summary of a level document, computed without generating anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub name: String,
    pub description: String,
    pub tile_count: usize,
    pub tiling_name: String,
    pub rulestring: String,
    pub created: Option<DateTime<Utc>>,
    pub total_connections: u64,
    pub connections_by_weight: BTreeMap<u8, usize>,
}

// ============================================================================
// Validation and parsing
// ============================================================================

/// Check the document's structure.
pub fn validate(value: &Value) -> Result<(), FormatError> {
    for key in ["metadata", "tiling", "dimensions", "tiles"] {
        if value.get(key).is_none_or(Value::is_null) {
            return Err(FormatError::MissingKey(key));
        }
    }
    if value["tiling"].get("rulestring").and_then(Value::as_str).is_none_or(str::is_empty) {
        return Err(FormatError::MissingKey("tiling.rulestring"));
    }
    let Some(tiles) = value["tiles"].as_array() else {
        return Err(FormatError::NotAnArray("tiles"));
    };

    for (index, tile) in tiles.iter().enumerate() {
        let invalid = |reason: &str| FormatError::InvalidTile { index, reason: reason.to_string() };
        if tile.get("id").and_then(Value::as_str).is_none_or(str::is_empty) {
            return Err(invalid("missing id"));
        }
        if !tile.get("position").is_some_and(Value::is_object) {
            return Err(invalid("position must be an object"));
        }
        if !tile.get("connections").is_some_and(Value::is_array) {
            return Err(invalid("connections must be an array"));
        }
    }
    Ok(())
}

/// Parse and validate a level document.
pub fn parse_document(json: &str) -> Result<LevelDocument, FormatError> {
    let value: Value = serde_json::from_str(json)?;
    validate(&value)?;
    Ok(serde_json::from_value(value)?)
}

pub fn level_stats(doc: &LevelDocument) -> LevelStats {
    let mut by_weight: BTreeMap<u8, usize> = [(0, 0), (1, 0), (2, 0)].into_iter().collect();
    let mut total = 0u64;
    for tile in &doc.tiles {
        for c in &tile.connections {
            total += c.connections as u64;
            *by_weight.entry(c.connections).or_insert(0) += 1;
        }
    }
    LevelStats {
        name: if doc.metadata.name.is_empty() { "Unnamed Level".into() } else { doc.metadata.name.clone() },
        description: doc.metadata.description.clone(),
        tile_count: doc.tiles.len(),
        tiling_name: if doc.tiling.name.is_empty() { "Custom".into() } else { doc.tiling.name.clone() },
        rulestring: doc.tiling.rulestring.clone(),
        created: doc.metadata.created,
        total_connections: total,
        connections_by_weight: by_weight,
    }
}

// ============================================================================
// Export
// ============================================================================

/// Snapshot `level` as a document.
pub fn export_level(level: &Level, name: &str, description: &str, dimensions: Dimensions) -> LevelDocument {
    let rulestring = level.tiling().rule_string();
    let tiling_name = catalog::find_by_rule(&rulestring)
        .map(|entry| entry.display_name(level.tiling().is_dual).to_string())
        .unwrap_or_else(|| "Custom".to_string());

    let tiles = level
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| TileRecord {
            id: tile_id(i, node.centroid()),
            position: Position { x: node.centroid().x, y: node.centroid().y },
            connections: node.edges().iter().map(|e| Connection { connections: e.weight }).collect(),
            turns: Some(node.turns()),
            mirrored: Some(node.is_mirrored()),
        })
        .collect();

    LevelDocument {
        metadata: Metadata {
            name: name.to_string(),
            description: description.to_string(),
            created: Some(Utc::now()),
        },
        tiling: TilingInfo {
            rulestring,
            transform_steps: level.config().transform_steps,
            name: tiling_name,
        },
        dimensions,
        tiles,
        effects: level.effects().to_vec(),
    }
}

// ============================================================================
// Import
// ============================================================================

/// Rebuild a level from a document.
///
/// The tiling is regenerated from the rule string. When its node count
/// matches the document, each tile's orientation and weights are applied
/// (matched by id, falling back to position in the list) and nothing is
/// shuffled. Otherwise a fresh level is built from the rule and the
/// outcome is [`ImportOutcome::Reconstructed`].
pub fn import_level<R: Rng + ?Sized>(
    doc: &LevelDocument,
    config: &Config,
    rng: &mut R,
) -> Result<(Level, ImportOutcome), FormatError> {
    let config = Config { transform_steps: doc.tiling.transform_steps, ..config.clone() };
    let tiling = TilingGenerator::new(config.clone()).generate(&doc.tiling.rulestring)?;

    if tiling.len() != doc.tiles.len() {
        warn!(
            generated = tiling.len(),
            exported = doc.tiles.len(),
            "level data mismatch, reconstructing from rule"
        );
        return Ok((Level::new(tiling, &config, rng), ImportOutcome::Reconstructed));
    }

    let ids: HashMap<String, usize> =
        (0..tiling.len()).map(|i| (tile_id(i, tiling.nodes[i].centroid()), i)).collect();
    let mut level = Level::assemble(tiling, &config);

    let mut placed = Vec::with_capacity(doc.tiles.len());
    for (position, record) in doc.tiles.iter().enumerate() {
        let index = ids.get(&record.id).copied().unwrap_or(position);
        placed.push(index);
        let node = &mut level.tiling.nodes[index];
        if record.turns.is_some() || record.mirrored.is_some() {
            node.set_orientation(record.turns.unwrap_or(0), record.mirrored.unwrap_or(false));
        }
        for (edge, c) in record.connections.iter().enumerate().take(node.edges().len()) {
            node.set_weight(edge, c.connections);
        }
    }
    level.effects = restore_effects(&doc.effects, &placed)?;

    level.count_min_moves();
    level.classify_tiles();
    level.check_solved();
    debug!(tiles = level.len(), solved = level.is_solved(), "level imported");
    Ok((level, ImportOutcome::Applied))
}

/// Map document effects onto node indices. `placed[i]` is the node that
/// tile record `i` was applied to.
fn restore_effects(effects: &[Effect], placed: &[usize]) -> Result<Vec<Effect>, FormatError> {
    effects
        .iter()
        .enumerate()
        .map(|(index, effect)| {
            let invalid = |reason: &str| FormatError::InvalidEffect { index, reason: reason.to_string() };
            let owner = *placed.get(effect.owner).ok_or_else(|| invalid("owner is not a tile"))?;
            let target = *placed.get(effect.target).ok_or_else(|| invalid("target is not a tile"))?;
            if owner == target {
                return Err(invalid("owner and target are the same tile"));
            }
            Ok(Effect { owner, target, kind: effect.kind })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SQUARE: &str = "4-4-0,4/r90/m(v2)";

    fn sample_level(seed: u64) -> Level {
        let config = Config::with_steps(2);
        Level::from_rule(SQUARE, &config, &mut StdRng::seed_from_u64(seed)).expect("square rule builds")
    }

    #[test]
    fn export_names_catalog_tilings() {
        let level = sample_level(1);
        let doc = export_level(&level, "first", "", Dimensions { width: 400.0, height: 300.0 });
        assert_eq!(doc.tiling.name, "square");
        assert_eq!(doc.tiling.transform_steps, 2);
        assert_eq!(doc.tiles.len(), level.len());
    }

    #[test]
    fn export_uses_camel_case_keys() {
        let doc = export_level(&sample_level(2), "x", "y", Dimensions { width: 1.0, height: 1.0 });
        let json = serde_json::to_value(&doc).expect("serializes");
        assert!(json["tiling"].get("transformSteps").is_some());
        assert!(json["tiles"][0]["connections"][0].get("connections").is_some());
    }

    #[test]
    fn validation_reports_missing_keys() {
        let value: Value = serde_json::json!({ "metadata": {}, "tiling": { "rulestring": "4" }, "tiles": [] });
        assert!(matches!(validate(&value), Err(FormatError::MissingKey("dimensions"))));

        let value: Value = serde_json::json!({
            "metadata": {}, "tiling": { "rulestring": "" }, "dimensions": {}, "tiles": []
        });
        assert!(matches!(validate(&value), Err(FormatError::MissingKey("tiling.rulestring"))));

        let value: Value = serde_json::json!({
            "metadata": {}, "tiling": { "rulestring": "4" }, "dimensions": {}, "tiles": {}
        });
        assert!(matches!(validate(&value), Err(FormatError::NotAnArray("tiles"))));
    }

    #[test]
    fn validation_reports_bad_tiles() {
        let value: Value = serde_json::json!({
            "metadata": {}, "tiling": { "rulestring": "4" }, "dimensions": {},
            "tiles": [
                { "id": "a", "position": { "x": 0, "y": 0 }, "connections": [] },
                { "id": "b", "position": 3, "connections": [] }
            ]
        });
        match validate(&value) {
            Err(FormatError::InvalidTile { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidTile, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_tile_count_reconstructs() {
        let level = sample_level(3);
        let mut doc = export_level(&level, "", "", Dimensions { width: 1.0, height: 1.0 });
        doc.tiles.pop();
        let (rebuilt, outcome) =
            import_level(&doc, &Config::default(), &mut StdRng::seed_from_u64(4)).expect("imports");
        assert_eq!(outcome, ImportOutcome::Reconstructed);
        assert_eq!(rebuilt.len(), level.len());
    }

    #[test]
    fn effects_survive_export_and_import() {
        let config = Config::with_steps(2);
        let tiling = TilingGenerator::new(config.clone()).generate(SQUARE).expect("square rule");
        let level = Level::build(tiling, &config, 4, &mut StdRng::seed_from_u64(5));
        assert!(!level.effects().is_empty());

        let doc = export_level(&level, "", "", Dimensions { width: 1.0, height: 1.0 });
        let json = serde_json::to_string(&doc).expect("serializes");
        let (restored, outcome) = import_level(
            &parse_document(&json).expect("valid document"),
            &Config::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .expect("imports");
        assert_eq!(outcome, ImportOutcome::Applied);
        assert_eq!(restored.effects(), level.effects());
        assert_eq!(restored.min_moves_to_solve(), level.min_moves_to_solve());
    }

    #[test]
    fn effect_pointing_past_the_tiles_is_rejected() {
        let level = sample_level(6);
        let mut doc = export_level(&level, "", "", Dimensions { width: 1.0, height: 1.0 });
        doc.effects = vec![Effect { owner: 0, target: doc.tiles.len(), kind: crate::level::EffectKind::Mirror }];
        match import_level(&doc, &Config::default(), &mut StdRng::seed_from_u64(0)) {
            Err(FormatError::InvalidEffect { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected InvalidEffect, got {other:?}"),
        }
    }

    #[test]
    fn documents_without_effects_still_load() {
        let doc = parse_document(
            r#"{ "metadata": {}, "tiling": { "rulestring": "4" }, "dimensions": { "width": 1, "height": 1 }, "tiles": [] }"#,
        )
        .expect("valid document");
        assert!(doc.effects.is_empty());
        let json = serde_json::to_value(&doc).expect("serializes");
        assert!(json.get("effects").is_none());
    }

    #[test]
    fn stats_count_connections() {
        let doc = parse_document(
            r#"{
                "metadata": { "name": "", "created": "2026-01-02T03:04:05Z" },
                "tiling": { "rulestring": "4" },
                "dimensions": { "width": 10, "height": 10 },
                "tiles": [
                    { "id": "t0", "position": { "x": 0, "y": 0 },
                      "connections": [ { "connections": 2 }, { "connections": 1 }, { "connections": 0 }, {} ] }
                ]
            }"#,
        )
        .expect("valid document");
        assert_eq!(doc.tiling.transform_steps, 1);
        let stats = level_stats(&doc);
        assert_eq!(stats.name, "Unnamed Level");
        assert_eq!(stats.tiling_name, "Custom");
        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.connections_by_weight[&0], 2);
        assert_eq!(stats.connections_by_weight[&2], 1);
        assert!(stats.created.is_some());
    }
}
