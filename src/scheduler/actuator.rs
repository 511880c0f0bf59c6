//! The actuator: whatever moves, equips, places and digs on the builder's behalf.

use crate::types::{BlockPosition, Direction, Half};
use async_trait::async_trait;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures an actuator can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Navigation found no path to the goal.
    #[error("no path to goal")]
    NoPath,

    /// Navigation gave up on its own deadline.
    #[error("navigation timed out")]
    Timeout,

    /// The world did not accept the placement.
    #[error("placement rejected: {0}")]
    Rejected(String),

    /// The action needs a specific item in hand.
    #[error("must be holding item {0}")]
    MustHold(u32),

    /// Rate limited; try again shortly.
    #[error("actuator busy")]
    Busy,

    #[error("{0}")]
    Other(String),
}

/// Where to stand to place a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceGoal {
    pub position: BlockPosition,
    /// Directions toward the neighbors that may be clicked.
    pub faces: Vec<Direction>,
    /// Facing the placed block must end up with.
    pub facing: Option<Direction>,
    /// Whether `facing` may be vertical.
    pub facing_3d: bool,
    pub half: Option<Half>,
    pub range: f32,
    pub line_of_sight: bool,
}

/// Where to stand to break a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakGoal {
    pub position: BlockPosition,
    pub range: f32,
}

/// A navigation goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    Place(PlaceGoal),
    Break(BreakGoal),
}

impl Goal {
    /// The block the goal is about.
    pub fn position(&self) -> BlockPosition {
        match self {
            Goal::Place(goal) => goal.position,
            Goal::Break(goal) => goal.position,
        }
    }
}

/// Extra detail for a placement click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceOptions {
    pub half: Option<Half>,
    /// Click point relative to the reference block's corner.
    pub delta: Vec3,
}

/// Capabilities the scheduler needs from the outside world.
///
/// Every async method is a suspension point. The scheduler never calls two of
/// them concurrently.
#[async_trait]
pub trait Actuator: Send {
    /// Current feet position.
    fn position(&self) -> Vec3;

    /// Item currently in hand.
    fn held_item(&self) -> Option<u32>;

    /// How many of an item the inventory holds.
    fn item_count(&self, item: u32) -> u32;

    /// Best tool for breaking the block at `pos`, if any.
    fn best_tool(&self, pos: BlockPosition) -> Option<u32>;

    async fn equip(&mut self, item: u32) -> Result<(), ActuatorError>;

    /// Move until the goal is satisfied.
    async fn navigate_to(&mut self, goal: &Goal) -> Result<(), ActuatorError>;

    async fn look_at(&mut self, point: Vec3) -> Result<(), ActuatorError>;

    async fn set_sneaking(&mut self, sneaking: bool) -> Result<(), ActuatorError>;

    /// Click `face` of `reference` with the held item.
    async fn place(
        &mut self,
        reference: BlockPosition,
        face: Direction,
        options: PlaceOptions,
    ) -> Result<(), ActuatorError>;

    async fn dig(&mut self, pos: BlockPosition) -> Result<(), ActuatorError>;
}
