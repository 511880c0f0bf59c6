//! Read access to the world being built in.

use crate::types::{Aabb, BlockPosition, StateId};
use serde::{Deserialize, Serialize};

/// A block as currently present in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBlock {
    /// Block name, e.g., "minecraft:chest"
    pub name: String,
    /// Whether the block can be broken at all.
    pub diggable: bool,
    /// Collision boxes in block-local coordinates. Empty for air and plants.
    #[serde(default)]
    pub shapes: Vec<Aabb>,
}

/// Trait for world state sources.
///
/// Both queries return `None` for cells the source does not know about, such as
/// unloaded chunks.
pub trait WorldView {
    /// Get the state id at a position.
    fn state_at(&self, pos: BlockPosition) -> Option<StateId>;

    /// Get the block at a position.
    fn block_at(&self, pos: BlockPosition) -> Option<WorldBlock>;
}

impl<W: WorldView + ?Sized> WorldView for &W {
    fn state_at(&self, pos: BlockPosition) -> Option<StateId> {
        (**self).state_at(pos)
    }

    fn block_at(&self, pos: BlockPosition) -> Option<WorldBlock> {
        (**self).block_at(pos)
    }
}
