//! Collision shapes and contact-face queries.

use super::Direction;
use glam::Vec3;
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-4;

/// An axis-aligned collision box in block-local coordinates (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A full cube.
    pub const FULL: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ONE,
    };

    /// The lower half of a cube (bottom slab).
    pub const BOTTOM_HALF: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::new(1.0, 0.5, 1.0),
    };

    /// The upper half of a cube (top slab).
    pub const TOP_HALF: Aabb = Aabb {
        min: Vec3::new(0.0, 0.5, 0.0),
        max: Vec3::ONE,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check whether the face in `direction` lies on the block boundary.
    fn touches_boundary(&self, direction: Direction) -> bool {
        match direction {
            Direction::Down => self.min.y <= EPSILON,
            Direction::Up => self.max.y >= 1.0 - EPSILON,
            Direction::North => self.min.z <= EPSILON,
            Direction::South => self.max.z >= 1.0 - EPSILON,
            Direction::West => self.min.x <= EPSILON,
            Direction::East => self.max.x >= 1.0 - EPSILON,
        }
    }
}

/// Which vertical half of a cell a block occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Half {
    Top,
    Bottom,
    Upper,
    Lower,
}

impl Half {
    /// Parse a `half` or slab `type` property value. `double` has no half.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Half::Top),
            "bottom" => Some(Half::Bottom),
            "upper" => Some(Half::Upper),
            "lower" => Some(Half::Lower),
            _ => None,
        }
    }
}

impl std::fmt::Display for Half {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Half::Top => write!(f, "top"),
            Half::Bottom => write!(f, "bottom"),
            Half::Upper => write!(f, "upper"),
            Half::Lower => write!(f, "lower"),
        }
    }
}

/// Compute the centers of the faces that `shapes` expose in `face` direction.
///
/// Only faces lying on the block boundary count as contact faces. For a
/// horizontal face and a `top`/`bottom` half, the face is clipped to that half
/// of the cell and dropped if nothing remains.
pub fn face_centers(shapes: &[Aabb], face: Direction, half: Option<Half>) -> Vec<Vec3> {
    let normal = face.normal();
    let mut centers = Vec::new();

    for shape in shapes {
        if !shape.touches_boundary(face) {
            continue;
        }

        let mut min = shape.min;
        let mut max = shape.max;

        if !face.is_vertical() {
            match half {
                Some(Half::Top) => min.y = min.y.max(0.5),
                Some(Half::Bottom) => max.y = max.y.min(0.5),
                _ => {}
            }
            if max.y - min.y <= EPSILON {
                continue;
            }
        }

        let half_size = (max - min) * 0.5;
        let center = (min + max) * 0.5 + half_size * normal;
        centers.push(center);
    }

    centers
}
