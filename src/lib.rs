//! # Voxel Builder
//!
//! A Rust library for planning and executing incremental voxel builds.
//!
//! ## Overview
//!
//! This library takes a target (a fixed blueprint or a procedural generator)
//! and the current world as input, diffs the two into an ordered plan of dig
//! and place actions, and executes that plan through an actuator that moves,
//! equips, places and digs.
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxel_builder::{load_blueprint, load_registry, Build, Builder, TargetDescriptor, BlockPosition};
//!
//! // Load a blueprint and the block registry
//! let grid = load_blueprint(&blueprint_json)?;
//! let registry = load_registry(&registry_json)?;
//!
//! // Plan the build against the current world
//! let target = TargetDescriptor::bounded(grid, BlockPosition::new(0, 64, 0));
//! let build = Build::new(target, &world, registry)?;
//!
//! // Execute it
//! let mut builder = Builder::new(world, actuator);
//! let outcome = builder.build(build).await?;
//! ```
//!
//! ## Library Integration
//!
//! Hosts provide world access by implementing `WorldView`, block metadata by
//! implementing `BlockRegistry`, and motion by implementing `Actuator`. Planning
//! is synchronous; only execution needs an async runtime.
//!
//! ```ignore
//! use voxel_builder::{TargetDescriptor, BlockPosition};
//!
//! // A flat stone floor following the anchor wherever it is planned from
//! let target = TargetDescriptor::unbounded(anchor, |pos| (pos.y == 0).then_some(stone));
//! ```

pub mod error;
pub mod types;
pub mod catalog;
pub mod search;
pub mod world;
pub mod plan;
pub mod build;
pub mod scheduler;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use error::{BuilderError, Result};
pub use types::{Direction, Axis, Half, Aabb, BlockPosition, BoundingBox, StateId};
pub use catalog::{
    BlockCatalog, BlockDescriptor, BlockRegistry, BlockState, Item, OrientationTable,
    StaticRegistry,
};
pub use search::{SearchShape, OctahedronIterator, SpiralIterator};
pub use world::{WorldBlock, WorldView};
pub use plan::{
    Action, ActionPlan, BlockMatchStrictness, Blueprint, DiffPlanner, MatchPolicy, PlannerConfig,
    TargetDescriptor, VoxelGrid,
};
pub use build::Build;
pub use scheduler::{
    Actuator, ActuatorError, BuildControl, BuildOptions, BuildOutcome, BuildStatus, Builder,
    SchedulerState,
};

/// Load a blueprint grid from JSON.
pub fn load_blueprint(json: &str) -> Result<VoxelGrid> {
    VoxelGrid::from_json(json)
}

/// Load a block registry from JSON.
pub fn load_registry(json: &str) -> Result<StaticRegistry> {
    StaticRegistry::from_json(json)
}
