//! Effects: one tile's moves driving another tile.
//!
//! An effect is a directed edge `owner -> target` in the node arena. Every
//! turn of the owner (and every mirror of it) applies the effect to the
//! target once, in the owner's direction: turning the owner back turns the
//! target back. Effects do not chain: a target's own effects are not
//! triggered by an effect landing on it.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cycle::symmetries;
use crate::polygon::Polygon;

use super::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Turn the target by this many steps.
    Rotate { turns: i32 },
    Mirror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub owner: usize,
    pub target: usize,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl Effect {
    /// Apply to the target node for one owner step in direction `step`
    /// (its sign is used). Unknown targets are ignored.
    pub fn resolve(&self, nodes: &mut [Polygon], step: i32) {
        let Some(target) = nodes.get_mut(self.target) else {
            return;
        };
        match self.kind {
            EffectKind::Rotate { turns } => target.rotate(turns * step.signum()),
            EffectKind::Mirror => target.mirror(),
        }
    }
}

impl Level {
    /// Attach up to `count` random effects and return how many were added.
    ///
    /// Owners carry at least one connector. A target is never its owner,
    /// never already driven by the same owner and never drives the owner
    /// back. Mirror targets must have no axial symmetry, since mirroring
    /// them would change nothing.
    pub fn attach_effects<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> usize {
        let nodes = &self.tiling.nodes;
        let owners: Vec<usize> = (0..nodes.len()).filter(|&i| nodes[i].has_connector()).collect();
        let asymmetric: Vec<bool> = nodes.iter().map(|n| !symmetries(&n.weights()).axial).collect();

        let mut added = 0;
        let mut attempts = 0;
        while added < count && attempts < count * 8 {
            attempts += 1;
            let Some(&owner) = owners.choose(rng) else {
                break;
            };
            let mirror = rng.random_bool(0.5);

            let candidates: Vec<usize> = (0..nodes.len())
                .filter(|&t| t != owner)
                .filter(|&t| !mirror || asymmetric[t])
                .filter(|&t| {
                    !self
                        .effects
                        .iter()
                        .any(|e| (e.owner == owner && e.target == t) || (e.owner == t && e.target == owner))
                })
                .collect();
            let Some(&target) = candidates.choose(rng) else {
                continue;
            };

            let kind = if mirror {
                EffectKind::Mirror
            } else {
                let n = nodes[target].sides().max(2) as i32;
                EffectKind::Rotate { turns: rng.random_range(1..n) }
            };
            debug!(owner, target, ?kind, "effect attached");
            self.effects.push(Effect { owner, target, kind });
            added += 1;
        }
        added
    }
}
