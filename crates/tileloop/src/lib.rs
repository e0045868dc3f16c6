//! # tileloop
//!
//! Polygon tilings generated from compact rule strings, and a
//! connector-loop puzzle built on top of them.
//!
//! ```text
//! rule string -> ParsedRule -> TilingGenerator -> Tiling -> Level
//! ```
//!
//! ## Rust Lesson #7: Re-exports as the public face
//!
//! The modules below are all public, so `tileloop::level::format::export_level`
//! works. The `pub use` lines lift the types most callers need to the crate
//! root, so the CLI can write `tileloop::export_level` and never care which
//! file it lives in. Moving a function between modules then only touches
//! this list, not every caller.

pub mod catalog;
pub mod config;
pub mod cycle;
pub mod generator;
pub mod geometry;
pub mod level;
pub mod polygon;
pub mod rule;
pub mod spatial;
pub mod tiling;

// Re-export common types at crate root for convenience.
pub use catalog::CatalogEntry;
pub use config::{ColorParams, Config, GenerationLimits, Neighborhood};
pub use generator::{GenerateError, TilingGenerator};
pub use geometry::{DEFAULT_TOLERANCE, Vector2};
pub use level::format::{
    Dimensions, FormatError, ImportOutcome, LevelDocument, LevelStats, export_level, import_level,
    level_stats, parse_document,
};
pub use level::{Effect, EffectKind, Level};
pub use polygon::{EdgeConnector, Polygon, RenderNode, Shape, TileClass};
pub use rule::{ParsedRule, RuleError, parse_rule};
pub use tiling::{GenerationStats, StopReason, Tiling};
