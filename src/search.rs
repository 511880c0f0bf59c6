//! Outward coordinate enumeration for bounded searches.
//!
//! Both iterators are finite and hold nothing but their cursor, so restarting a
//! search means constructing a fresh iterator.

use crate::types::BlockPosition;
use serde::{Deserialize, Serialize};

/// Shape of the region walked when planning around a center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchShape {
    /// Full 3D diamond of Manhattan radius `r`.
    #[default]
    Octahedron,
    /// Horizontal square spiral in the center's layer.
    Spiral,
}

impl SearchShape {
    /// Build an iterator of this shape.
    pub fn iter(
        self,
        center: BlockPosition,
        max_distance: u32,
    ) -> Box<dyn Iterator<Item = BlockPosition> + Send> {
        match self {
            SearchShape::Octahedron => Box::new(OctahedronIterator::new(center, max_distance)),
            SearchShape::Spiral => Box::new(SpiralIterator::new(center, max_distance as f32)),
        }
    }
}

/// Square spiral in the XZ plane.
///
/// Walks unit steps, turning 90 degrees whenever the current leg is used up
/// and growing the leg every second turn. For a radius `r` it yields
/// `floor(((floor(r) - 0.5) * 2)^2)` positions.
#[derive(Debug, Clone)]
pub struct SpiralIterator {
    start: BlockPosition,
    total: usize,
    emitted: usize,
    // current offset
    i: i32,
    j: i32,
    // current heading
    di: i32,
    dj: i32,
    leg_length: i32,
    leg_walked: i32,
}

impl SpiralIterator {
    pub fn new(start: BlockPosition, max_distance: f32) -> Self {
        let side = (max_distance.floor() - 0.5) * 2.0;
        Self {
            start,
            total: (side * side).floor() as usize,
            emitted: 0,
            i: 0,
            j: 0,
            di: 1,
            dj: 0,
            leg_length: 1,
            leg_walked: 0,
        }
    }

    /// Number of positions this iterator yields in total.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for SpiralIterator {
    type Item = BlockPosition;

    fn next(&mut self) -> Option<BlockPosition> {
        if self.emitted >= self.total {
            return None;
        }
        let output = self.start.offset(self.i, 0, self.j);

        self.i += self.di;
        self.j += self.dj;
        self.leg_walked += 1;
        if self.leg_walked == self.leg_length {
            self.leg_walked = 0;
            let di = self.di;
            self.di = -self.dj;
            self.dj = di;
            if self.dj == 0 {
                self.leg_length += 1;
            }
        }

        self.emitted += 1;
        Some(output)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.emitted;
        (remaining, Some(remaining))
    }
}

/// Octahedral shells of growing Manhattan distance around a center.
///
/// Shell `d` is produced in full before shell `d + 1`; within a shell the order
/// is by `y`, then `x`, then `z`.
#[derive(Debug, Clone)]
pub struct OctahedronIterator {
    start: BlockPosition,
    max_distance: i32,
    distance: i32,
    x: i32,
    y: i32,
    // pending mirrored z for the current (x, y)
    pending_z: Option<i32>,
}

impl OctahedronIterator {
    pub fn new(start: BlockPosition, max_distance: u32) -> Self {
        Self {
            start,
            max_distance: max_distance.min(i32::MAX as u32) as i32,
            distance: 0,
            x: 0,
            y: 0,
            pending_z: None,
        }
    }

    /// Advance (x, y) to the next column of the current shell.
    fn advance(&mut self) {
        let x_span = self.distance - self.y.abs();
        if self.x < x_span {
            self.x += 1;
            return;
        }
        if self.y < self.distance {
            self.y += 1;
        } else {
            self.distance += 1;
            self.y = -self.distance;
        }
        self.x = -(self.distance - self.y.abs());
    }
}

impl Iterator for OctahedronIterator {
    type Item = BlockPosition;

    fn next(&mut self) -> Option<BlockPosition> {
        if let Some(z) = self.pending_z.take() {
            let output = self.start.offset(self.x, self.y, z);
            self.advance();
            return Some(output);
        }

        if self.distance > self.max_distance {
            return None;
        }

        let rest = self.distance - self.x.abs() - self.y.abs();
        let output = self.start.offset(self.x, self.y, -rest);
        if rest > 0 {
            self.pending_z = Some(rest);
        } else {
            self.advance();
        }
        Some(output)
    }
}
