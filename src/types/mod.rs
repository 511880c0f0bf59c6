//! Shared types used throughout the library.

mod direction;
mod shape;

pub use direction::{Axis, Direction};
pub use shape::{face_centers, Aabb, Half};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Numeric identifier of a concrete block variant, properties included.
pub type StateId = u32;

/// A block position in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing a world-space point.
    pub fn containing(point: Vec3) -> Self {
        Self {
            x: point.x.floor() as i32,
            y: point.y.floor() as i32,
            z: point.z.floor() as i32,
        }
    }

    /// Get the neighboring position in the given direction.
    pub fn neighbor(&self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        self.offset(dx, dy, dz)
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Component-wise sum.
    pub fn plus(&self, other: BlockPosition) -> Self {
        self.offset(other.x, other.y, other.z)
    }

    /// Component-wise difference.
    pub fn minus(&self, other: BlockPosition) -> Self {
        self.offset(-other.x, -other.y, -other.z)
    }

    /// The lower corner of the block in world space.
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// The center of the block in world space.
    pub fn center(&self) -> Vec3 {
        self.as_vec3() + Vec3::splat(0.5)
    }
}

impl std::fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An integer box of block positions, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: BlockPosition,
    pub max: BlockPosition,
}

impl BoundingBox {
    pub fn new(min: BlockPosition, max: BlockPosition) -> Self {
        Self { min, max }
    }

    /// Box starting at `min` with the given size along each axis.
    pub fn from_size(min: BlockPosition, size: [i32; 3]) -> Self {
        Self {
            min,
            max: min.offset(size[0], size[1], size[2]),
        }
    }

    pub fn dimensions(&self) -> [i32; 3] {
        [
            (self.max.x - self.min.x).max(0),
            (self.max.y - self.min.y).max(0),
            (self.max.z - self.min.z).max(0),
        ]
    }

    /// Number of cells in the box.
    pub fn volume(&self) -> usize {
        let [x, y, z] = self.dimensions();
        x as usize * y as usize * z as usize
    }

    pub fn contains(&self, pos: BlockPosition) -> bool {
        pos.x >= self.min.x
            && pos.x < self.max.x
            && pos.y >= self.min.y
            && pos.y < self.max.y
            && pos.z >= self.min.z
            && pos.z < self.max.z
    }

    /// Iterate over every position, layer by layer (y, then z, then x).
    pub fn positions(&self) -> impl Iterator<Item = BlockPosition> {
        let BoundingBox { min, max } = *self;
        (min.y..max.y).flat_map(move |y| {
            (min.z..max.z)
                .flat_map(move |z| (min.x..max.x).map(move |x| BlockPosition::new(x, y, z)))
        })
    }
}
