//! Attachment geometry: which neighbors a block can be placed against.
//!
//! Directions returned here point from the placement cell to the supporting
//! neighbor. A ladder facing north hangs on the block to its south, so its
//! only candidate direction is `South`.

use crate::catalog::{BlockState, OrientationTable};
use crate::types::{face_centers, BlockPosition, Direction, Half};
use crate::world::WorldView;
use glam::Vec3;

/// Directions allowed by the block's own properties, before looking at the
/// world.
pub fn candidate_directions(state: &BlockState, orientation: &OrientationTable) -> Vec<Direction> {
    let props = &state.properties;

    // The upper half of a door or tall plant is placed with its lower half
    if props.half == Some(Half::Upper) {
        return Vec::new();
    }

    let mut dirs = Direction::ALL.to_vec();

    if let Some(axis) = props.axis {
        dirs.retain(|d| d.axis() == axis);
    }

    if matches!(props.half, Some(Half::Top) | Some(Half::Bottom)) {
        dirs.retain(|d| !d.is_vertical());
    }

    if let Some(resolved) = orientation.resolve(state) {
        if resolved.constrains_attachment {
            let support = resolved.facing.opposite();
            dirs.retain(|d| *d == support);
        }
    }

    if props.hanging {
        dirs.retain(|d| *d == Direction::Up);
    }

    if state.is_plant() {
        dirs.retain(|d| *d == Direction::Down);
    }

    dirs
}

/// Directions whose neighbor currently exposes a contact face to `pos`.
pub fn attachment_directions(
    state: &BlockState,
    orientation: &OrientationTable,
    pos: BlockPosition,
    world: &dyn WorldView,
) -> Vec<Direction> {
    let half = state.properties.half;
    candidate_directions(state, orientation)
        .into_iter()
        .filter(|dir| match world.block_at(pos.neighbor(*dir)) {
            Some(block) => !face_centers(&block.shapes, dir.opposite(), half).is_empty(),
            None => false,
        })
        .collect()
}

/// Where to click to place a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAndRef {
    /// The supporting block that gets clicked.
    pub reference: BlockPosition,
    /// Face of the reference block pointing at the placement cell.
    pub face: Direction,
    /// World-space point on that face to look at.
    pub point: Vec3,
}

impl FaceAndRef {
    /// Click point relative to the reference block's corner.
    pub fn delta(&self) -> Vec3 {
        self.point - self.reference.as_vec3()
    }
}

/// Pick the contact face closest to `eye` within `range`.
pub fn face_and_ref(
    pos: BlockPosition,
    directions: &[Direction],
    half: Option<Half>,
    world: &dyn WorldView,
    eye: Vec3,
    range: f32,
) -> Option<FaceAndRef> {
    let mut best: Option<(f32, FaceAndRef)> = None;

    for dir in directions {
        let reference = pos.neighbor(*dir);
        let Some(block) = world.block_at(reference) else {
            continue;
        };
        let face = dir.opposite();

        for center in face_centers(&block.shapes, face, half) {
            let point = reference.as_vec3() + center;
            let distance = eye.distance(point);
            if distance > range {
                continue;
            }
            if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                best = Some((
                    distance,
                    FaceAndRef {
                        reference,
                        face,
                        point,
                    },
                ));
            }
        }
    }

    best.map(|(_, far)| far)
}
