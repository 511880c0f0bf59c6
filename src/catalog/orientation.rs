//! Per-block orientation metadata.
//!
//! The `facing` property means different things for different blocks. A ladder
//! facing north hangs on the block to its south; a hopper facing east is
//! attached to the block on its east; a furnace facing north can be placed
//! against anything. The table records, per block type:
//!
//! - `inverted`: facing points the other way than the canonical convention
//! - `faceDirection`: facing decides which neighbor the block attaches to
//! - `is3D`: facing may be up or down, not only horizontal

use super::{strip_namespace, BlockState};
use crate::error::Result;
use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const FACING_DATA: &str = include_str!("../../data/facing.json");

/// Orientation metadata for a block type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacingInfo {
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub face_direction: bool,
    #[serde(default, rename = "is3D")]
    pub is_3d: bool,
}

/// A block's facing after the inversion rule was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFacing {
    pub facing: Direction,
    pub is_3d: bool,
    /// Facing restricts the attachment face.
    pub constrains_attachment: bool,
}

/// Block name to orientation metadata.
#[derive(Debug, Clone, Default)]
pub struct OrientationTable {
    entries: HashMap<String, FacingInfo>,
}

impl OrientationTable {
    /// Load the built-in table.
    pub fn load() -> Result<Self> {
        Self::from_json(FACING_DATA)
    }

    /// Parse a table from JSON keyed by block id.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, FacingInfo> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&FacingInfo> {
        self.entries.get(strip_namespace(name))
    }

    /// Resolve the facing of a state, or `None` if it has no `facing`.
    pub fn resolve(&self, state: &BlockState) -> Option<ResolvedFacing> {
        let raw = state.properties.facing?;

        let info = match self.get(&state.name) {
            Some(info) => *info,
            None => {
                tracing::debug!(block = %state.name, "no orientation data, assuming plain facing");
                FacingInfo {
                    is_3d: raw.is_vertical(),
                    ..FacingInfo::default()
                }
            }
        };

        let facing = if info.inverted { raw.opposite() } else { raw };

        Some(ResolvedFacing {
            facing,
            is_3d: info.is_3d,
            constrains_attachment: info.face_direction,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
