//! CLI command implementations.
//!
//! - `generate` - Generate a tiling from a rule or by random growth
//! - `level` - Build and export a puzzle level
//! - `import` - Load a level document
//! - `rules` - List the named tilings
//! - `benchmark` - Time tiling generation

pub mod benchmark;
pub mod common;
pub mod generate;
pub mod import;
pub mod level;
pub mod render;
pub mod rules;

pub use benchmark::{BenchmarkArgs, cmd_benchmark};
pub use common::load_config;
pub use generate::{GenerateArgs, cmd_generate};
pub use import::{ImportArgs, cmd_import};
pub use level::{LevelArgs, cmd_level};
pub use rules::{RulesArgs, cmd_rules};
