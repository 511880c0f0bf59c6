//! Build targets: fixed blueprints and procedural generators.

use crate::error::{BuilderError, Result};
use crate::types::{BlockPosition, BoundingBox, StateId};
use serde::{Deserialize, Serialize};

/// A finite grid of desired states.
///
/// Positions passed to [`Blueprint::state_id`] are relative to the anchor the
/// blueprint is built at. The grid covers `anchor_offset .. anchor_offset + size`.
pub trait Blueprint: Send + Sync {
    /// Desired state at an anchor-relative position, `None` outside the grid.
    fn state_id(&self, pos: BlockPosition) -> Option<StateId>;

    /// Grid dimensions (x, y, z).
    fn size(&self) -> [i32; 3];

    /// Offset of the grid's lower corner from the anchor.
    fn anchor_offset(&self) -> BlockPosition;

    /// Every distinct state used by the grid.
    fn palette(&self) -> &[StateId];
}

/// Procedural target: desired state for an anchor-relative position, or
/// `None` for no opinion.
pub type Generator = Box<dyn Fn(BlockPosition) -> Option<StateId> + Send + Sync>;

/// What the world should look like.
pub enum TargetDescriptor {
    /// A blueprint placed at `anchor`, covering `bounds` in world space.
    Bounded {
        grid: Box<dyn Blueprint>,
        anchor: BlockPosition,
        bounds: BoundingBox,
    },
    /// A generator evaluated relative to `anchor`, with no fixed extent.
    Unbounded {
        generator: Generator,
        anchor: BlockPosition,
    },
}

impl TargetDescriptor {
    /// Place a blueprint with its origin at `anchor`.
    pub fn bounded(grid: impl Blueprint + 'static, anchor: BlockPosition) -> Self {
        let bounds = BoundingBox::from_size(anchor.plus(grid.anchor_offset()), grid.size());
        TargetDescriptor::Bounded {
            grid: Box::new(grid),
            anchor,
            bounds,
        }
    }

    /// Follow a generator around `anchor`.
    pub fn unbounded(
        anchor: BlockPosition,
        generator: impl Fn(BlockPosition) -> Option<StateId> + Send + Sync + 'static,
    ) -> Self {
        TargetDescriptor::Unbounded {
            generator: Box::new(generator),
            anchor,
        }
    }

    pub fn anchor(&self) -> BlockPosition {
        match self {
            TargetDescriptor::Bounded { anchor, .. }
            | TargetDescriptor::Unbounded { anchor, .. } => *anchor,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, TargetDescriptor::Unbounded { .. })
    }

    /// Desired state at a world position.
    pub fn desired_at(&self, pos: BlockPosition) -> Option<StateId> {
        match self {
            TargetDescriptor::Bounded { grid, anchor, .. } => grid.state_id(pos.minus(*anchor)),
            TargetDescriptor::Unbounded { generator, anchor } => generator(pos.minus(*anchor)),
        }
    }
}

impl std::fmt::Debug for TargetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetDescriptor::Bounded { anchor, bounds, .. } => f
                .debug_struct("Bounded")
                .field("anchor", anchor)
                .field("bounds", bounds)
                .finish(),
            TargetDescriptor::Unbounded { anchor, .. } => {
                f.debug_struct("Unbounded").field("anchor", anchor).finish()
            }
        }
    }
}

/// In-memory blueprint storing palette indices in y, z, x order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelGrid {
    size: [i32; 3],
    #[serde(default = "origin")]
    offset: BlockPosition,
    palette: Vec<StateId>,
    blocks: Vec<u32>,
}

fn origin() -> BlockPosition {
    BlockPosition::new(0, 0, 0)
}

impl VoxelGrid {
    /// Build a grid from palette indices.
    pub fn new(
        size: [i32; 3],
        offset: BlockPosition,
        palette: Vec<StateId>,
        blocks: Vec<u32>,
    ) -> Result<Self> {
        let grid = Self {
            size,
            offset,
            palette,
            blocks,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// A grid where every cell holds `state`.
    pub fn filled(size: [i32; 3], state: StateId) -> Self {
        let volume = size.iter().map(|s| (*s).max(0) as usize).product();
        Self {
            size,
            offset: origin(),
            palette: vec![state],
            blocks: vec![0; volume],
        }
    }

    /// Parse a grid from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let grid: Self = serde_json::from_str(json)?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn with_offset(mut self, offset: BlockPosition) -> Self {
        self.offset = offset;
        self
    }

    /// Set the state at an anchor-relative position.
    pub fn set(&mut self, pos: BlockPosition, state: StateId) -> Result<()> {
        let index = self
            .index(pos)
            .ok_or(BuilderError::OutsideBlueprint(pos))?;
        let palette_index = match self.palette.iter().position(|s| *s == state) {
            Some(i) => i,
            None => {
                self.palette.push(state);
                self.palette.len() - 1
            }
        };
        self.blocks[index] = palette_index as u32;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.size.iter().any(|s| *s < 0) {
            return Err(BuilderError::InvalidGrid(format!("negative size {:?}", self.size)));
        }
        let volume: usize = self.size.iter().map(|s| *s as usize).product();
        if self.blocks.len() != volume {
            return Err(BuilderError::InvalidGrid(format!(
                "expected {} cells, got {}",
                volume,
                self.blocks.len()
            )));
        }
        if let Some(bad) = self.blocks.iter().find(|b| **b as usize >= self.palette.len()) {
            return Err(BuilderError::InvalidGrid(format!(
                "palette index {} out of range",
                bad
            )));
        }
        Ok(())
    }

    fn index(&self, pos: BlockPosition) -> Option<usize> {
        let local = pos.minus(self.offset);
        let [sx, sy, sz] = self.size;
        let inside = (0..sx).contains(&local.x)
            && (0..sy).contains(&local.y)
            && (0..sz).contains(&local.z);
        if !inside {
            return None;
        }
        Some((local.y * sz * sx + local.z * sx + local.x) as usize)
    }
}

impl Blueprint for VoxelGrid {
    fn state_id(&self, pos: BlockPosition) -> Option<StateId> {
        let index = self.index(pos)?;
        self.palette.get(self.blocks[index] as usize).copied()
    }

    fn size(&self) -> [i32; 3] {
        self.size
    }

    fn anchor_offset(&self) -> BlockPosition {
        self.offset
    }

    fn palette(&self) -> &[StateId] {
        &self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_lookup_and_set() {
        let mut grid = VoxelGrid::filled([2, 2, 2], 0);
        grid.set(BlockPosition::new(1, 1, 0), 7).unwrap();

        assert_eq!(grid.state_id(BlockPosition::new(1, 1, 0)), Some(7));
        assert_eq!(grid.state_id(BlockPosition::new(0, 0, 0)), Some(0));
        assert_eq!(grid.state_id(BlockPosition::new(2, 0, 0)), None);
        assert_eq!(grid.palette(), &[0, 7]);
    }

    #[test]
    fn test_set_outside_fails() {
        let mut grid = VoxelGrid::filled([1, 1, 1], 0);
        assert!(matches!(
            grid.set(BlockPosition::new(0, -1, 0), 1),
            Err(BuilderError::OutsideBlueprint(_))
        ));
    }

    #[test]
    fn test_offset_shifts_grid() {
        let grid = VoxelGrid::filled([1, 1, 1], 3).with_offset(BlockPosition::new(-1, 0, 0));
        assert_eq!(grid.state_id(BlockPosition::new(-1, 0, 0)), Some(3));
        assert_eq!(grid.state_id(BlockPosition::new(0, 0, 0)), None);

        let target = TargetDescriptor::bounded(grid, BlockPosition::new(10, 64, 10));
        match &target {
            TargetDescriptor::Bounded { bounds, .. } => {
                assert_eq!(bounds.min, BlockPosition::new(9, 64, 10));
                assert_eq!(bounds.volume(), 1);
            }
            _ => panic!("Expected Bounded"),
        }
        assert_eq!(target.desired_at(BlockPosition::new(9, 64, 10)), Some(3));
    }

    #[test]
    fn test_grid_from_json() {
        let json = r#"{ "size": [2, 1, 1], "palette": [0, 1], "blocks": [1, 0] }"#;
        let grid = VoxelGrid::from_json(json).unwrap();
        assert_eq!(grid.state_id(BlockPosition::new(0, 0, 0)), Some(1));
        assert_eq!(grid.state_id(BlockPosition::new(1, 0, 0)), Some(0));
    }

    #[test]
    fn test_grid_validation() {
        let bad_len = r#"{ "size": [2, 1, 1], "palette": [0], "blocks": [0] }"#;
        assert!(matches!(VoxelGrid::from_json(bad_len), Err(BuilderError::InvalidGrid(_))));

        let bad_index = VoxelGrid::new([1, 1, 1], origin(), vec![0], vec![4]);
        assert!(matches!(bad_index, Err(BuilderError::InvalidGrid(_))));
    }

    #[test]
    fn test_unbounded_is_relative_to_anchor() {
        let target = TargetDescriptor::unbounded(BlockPosition::new(5, 5, 5), |pos| {
            (pos == BlockPosition::new(0, 0, 0)).then_some(1)
        });
        assert!(target.is_unbounded());
        assert_eq!(target.desired_at(BlockPosition::new(5, 5, 5)), Some(1));
        assert_eq!(target.desired_at(BlockPosition::new(0, 0, 0)), None);
    }
}
