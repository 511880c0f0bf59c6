//! Diff between the target and the world.
//!
//! | desired   | actual    | action                                   |
//! |-----------|-----------|------------------------------------------|
//! | empty     | empty     | none                                     |
//! | empty     | non-empty | dig                                      |
//! | non-empty | empty     | place                                    |
//! | non-empty | different | dig, then place depending on the dig     |
//! | non-empty | matching  | none                                     |
//!
//! Each row is further gated by the [`MatchPolicy`].

use super::{Action, ActionPlan, BlockMatchStrictness, MatchPolicy, TargetDescriptor};
use crate::catalog::BlockCatalog;
use crate::error::Result;
use crate::search::SearchShape;
use crate::types::{BlockPosition, StateId};
use crate::world::WorldView;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Limits for planning around an unbounded target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Search radius around the planning center.
    pub max_search_distance: u32,
    /// Maximum number of cells that produce actions in one pass.
    pub max_actions: usize,
    pub search_shape: SearchShape,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_search_distance: 50,
            max_actions: 50,
            search_shape: SearchShape::Octahedron,
        }
    }
}

/// What a single cell needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Nothing,
    Dig,
    Place,
    Replace,
}

/// Builds action plans by comparing desired and actual state.
#[derive(Debug, Clone, Default)]
pub struct DiffPlanner {
    policy: MatchPolicy,
    config: PlannerConfig,
}

impl DiffPlanner {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(policy: MatchPolicy, config: PlannerConfig) -> Self {
        Self { policy, config }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Compute a fresh plan.
    ///
    /// Bounded targets are diffed over their whole box. Unbounded targets are
    /// searched around `center`, falling back to the target's anchor.
    pub fn plan(
        &self,
        target: &TargetDescriptor,
        world: &dyn WorldView,
        catalog: &mut BlockCatalog,
        center: Option<BlockPosition>,
    ) -> Result<ActionPlan> {
        let plan = match target {
            TargetDescriptor::Bounded { grid, bounds, .. } => {
                catalog.warm(grid.palette())?;
                let mut plan = ActionPlan::new();
                for pos in bounds.positions() {
                    let Some(desired) = target.desired_at(pos) else {
                        continue;
                    };
                    let Some(actual) = world.state_at(pos) else {
                        tracing::debug!(%pos, "cell not loaded, skipping");
                        continue;
                    };
                    let decision = self.decide(catalog, desired, actual)?;
                    push_decision(&mut plan, pos, desired, decision);
                }
                plan
            }
            TargetDescriptor::Unbounded { .. } => {
                let center = center.unwrap_or_else(|| target.anchor());
                self.plan_around(target, world, catalog, center)?
            }
        };

        tracing::debug!(actions = plan.len(), "planned");
        Ok(plan)
    }

    fn plan_around(
        &self,
        target: &TargetDescriptor,
        world: &dyn WorldView,
        catalog: &mut BlockCatalog,
        center: BlockPosition,
    ) -> Result<ActionPlan> {
        let mut plan = ActionPlan::new();
        let mut visited = HashSet::new();
        let mut added = 0;

        for pos in self
            .config
            .search_shape
            .iter(center, self.config.max_search_distance)
        {
            if added >= self.config.max_actions {
                break;
            }
            if !visited.insert(pos) {
                continue;
            }
            let Some(desired) = target.desired_at(pos) else {
                continue;
            };
            let (Some(block), Some(actual)) = (world.block_at(pos), world.state_at(pos)) else {
                tracing::debug!(%pos, "cell not loaded, skipping");
                continue;
            };
            // Unbreakable blocks such as bedrock are left alone; air reports
            // non-diggable too but still accepts placements.
            if !block.diggable && !catalog.resolve(actual)?.is_air() {
                continue;
            }

            let decision = self.decide(catalog, desired, actual)?;
            if push_decision(&mut plan, pos, desired, decision) {
                added += 1;
            }
        }

        Ok(plan)
    }

    fn decide(
        &self,
        catalog: &mut BlockCatalog,
        desired: StateId,
        actual: StateId,
    ) -> Result<Decision> {
        let desired_empty = catalog.resolve(desired)?.is_air();
        let actual_empty = catalog.resolve(actual)?.is_air();

        let decision = match (desired_empty, actual_empty) {
            (true, true) => Decision::Nothing,
            (true, false) if self.policy.break_target_should_be_air => Decision::Dig,
            (true, false) => Decision::Nothing,
            (false, true) if self.policy.place_target_is_air => Decision::Place,
            (false, true) => Decision::Nothing,
            (false, false) => {
                if self.policy.break_target_should_be_different
                    && self.mismatched(catalog, desired, actual)
                {
                    Decision::Replace
                } else {
                    Decision::Nothing
                }
            }
        };
        Ok(decision)
    }

    fn mismatched(&self, catalog: &BlockCatalog, desired: StateId, actual: StateId) -> bool {
        match self.policy.block_match_strictness {
            BlockMatchStrictness::SameState => desired != actual,
            BlockMatchStrictness::SameName => {
                let desired = catalog.get(desired).map(|s| s.name.as_str());
                let actual = catalog.get(actual).map(|s| s.name.as_str());
                desired != actual
            }
        }
    }
}

/// Append the actions for a decision, returning whether anything was added.
fn push_decision(
    plan: &mut ActionPlan,
    pos: BlockPosition,
    desired: StateId,
    decision: Decision,
) -> bool {
    match decision {
        Decision::Nothing => false,
        Decision::Dig => plan.push(Action::Dig { position: pos }),
        Decision::Place => plan.push(Action::Place {
            position: pos,
            state: desired,
            depends_on: None,
        }),
        Decision::Replace => {
            let dug = plan.push(Action::Dig { position: pos });
            let placed = plan.push(Action::Place {
                position: pos,
                state: desired,
                depends_on: Some(pos),
            });
            dug || placed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::VoxelGrid;
    use crate::test_support::{registry, TestWorld, AIR, BEDROCK, DIRT, LOG_X, LOG_Y, STONE};

    fn catalog() -> BlockCatalog {
        BlockCatalog::new(registry())
    }

    fn single(state: StateId) -> TargetDescriptor {
        TargetDescriptor::bounded(VoxelGrid::filled([1, 1, 1], state), BlockPosition::new(0, 0, 0))
    }

    #[test]
    fn test_place_into_empty() {
        let world = TestWorld::new();
        let plan = DiffPlanner::default()
            .plan(&single(STONE), &world, &mut catalog(), None)
            .unwrap();

        assert_eq!(
            plan.actions(),
            &[Action::Place {
                position: BlockPosition::new(0, 0, 0),
                state: STONE,
                depends_on: None
            }]
        );
    }

    #[test]
    fn test_replace_different_block() {
        let world = TestWorld::new();
        let pos = BlockPosition::new(0, 0, 0);
        world.set(pos, DIRT);

        let policy = MatchPolicy::default().with_strictness(BlockMatchStrictness::SameName);
        let plan = DiffPlanner::new(policy)
            .plan(&single(STONE), &world, &mut catalog(), None)
            .unwrap();

        assert_eq!(
            plan.actions(),
            &[
                Action::Dig { position: pos },
                Action::Place {
                    position: pos,
                    state: STONE,
                    depends_on: Some(pos)
                }
            ]
        );
    }

    #[test]
    fn test_dig_when_target_empty() {
        let world = TestWorld::new();
        world.set(BlockPosition::new(0, 0, 0), DIRT);

        let plan = DiffPlanner::default()
            .plan(&single(AIR), &world, &mut catalog(), None)
            .unwrap();
        assert_eq!(plan.actions(), &[Action::Dig { position: BlockPosition::new(0, 0, 0) }]);

        let keep = MatchPolicy {
            break_target_should_be_air: false,
            ..MatchPolicy::default()
        };
        let plan = DiffPlanner::new(keep)
            .plan(&single(AIR), &world, &mut catalog(), None)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_strictness() {
        let world = TestWorld::new();
        world.set(BlockPosition::new(0, 0, 0), LOG_Y);

        let by_name = DiffPlanner::default()
            .plan(&single(LOG_X), &world, &mut catalog(), None)
            .unwrap();
        assert!(by_name.is_empty());

        let policy = MatchPolicy::default().with_strictness(BlockMatchStrictness::SameState);
        let by_state = DiffPlanner::new(policy)
            .plan(&single(LOG_X), &world, &mut catalog(), None)
            .unwrap();
        assert_eq!(by_state.len(), 2);
    }

    #[test]
    fn test_policy_flags_disable_rows() {
        let world = TestWorld::new();
        world.set(BlockPosition::new(0, 0, 0), DIRT);
        let policy = MatchPolicy {
            break_target_should_be_different: false,
            place_target_is_air: false,
            ..MatchPolicy::default()
        };
        let planner = DiffPlanner::new(policy);

        assert!(planner.plan(&single(STONE), &world, &mut catalog(), None).unwrap().is_empty());
        world.set(BlockPosition::new(0, 0, 0), AIR);
        assert!(planner.plan(&single(STONE), &world, &mut catalog(), None).unwrap().is_empty());
    }

    #[test]
    fn test_matching_world_gives_empty_plan() {
        let mut grid = VoxelGrid::filled([3, 2, 3], AIR);
        grid.set(BlockPosition::new(1, 0, 1), STONE).unwrap();
        grid.set(BlockPosition::new(2, 1, 0), DIRT).unwrap();
        let anchor = BlockPosition::new(4, 10, -2);

        let world = TestWorld::new();
        world.set(anchor.offset(1, 0, 1), STONE);
        world.set(anchor.offset(2, 1, 0), DIRT);

        let plan = DiffPlanner::default()
            .plan(&TargetDescriptor::bounded(grid, anchor), &world, &mut catalog(), None)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_size_bounded_by_volume() {
        let grid = VoxelGrid::filled([4, 3, 2], STONE);
        let volume = 4 * 3 * 2;
        let anchor = BlockPosition::new(0, 0, 0);

        let world = TestWorld::new();
        for pos in crate::types::BoundingBox::from_size(anchor, [4, 3, 2]).positions() {
            world.set(pos, DIRT);
        }

        let plan = DiffPlanner::default()
            .plan(&TargetDescriptor::bounded(grid, anchor), &world, &mut catalog(), None)
            .unwrap();
        assert_eq!(plan.len(), 2 * volume);
        assert!(plan.len() <= 2 * volume);
    }

    #[test]
    fn test_unbounded_no_opinion_is_empty() {
        let world = TestWorld::new();
        let target = TargetDescriptor::unbounded(BlockPosition::new(0, 0, 0), |_| None);
        let plan = DiffPlanner::default()
            .plan(&target, &world, &mut catalog(), None)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unbounded_respects_action_cap() {
        let world = TestWorld::new();
        let target = TargetDescriptor::unbounded(BlockPosition::new(0, 0, 0), |pos| {
            (pos.y == 0).then_some(STONE)
        });
        let config = PlannerConfig {
            max_search_distance: 10,
            max_actions: 7,
            search_shape: SearchShape::Spiral,
        };
        let plan = DiffPlanner::with_config(MatchPolicy::default(), config)
            .plan(&target, &world, &mut catalog(), None)
            .unwrap();

        assert_eq!(plan.len(), 7);
        assert!(plan.actions().iter().all(|a| a.position().y == 0));
    }

    #[test]
    fn test_unbounded_skips_undiggable() {
        let world = TestWorld::new();
        let center = BlockPosition::new(0, 0, 0);
        world.set(center, BEDROCK);

        let target =
            TargetDescriptor::unbounded(center, move |pos| (pos == center).then_some(AIR));
        let plan = DiffPlanner::default()
            .plan(&target, &world, &mut catalog(), Some(center))
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unbounded_plans_around_center() {
        let world = TestWorld::new();
        let target = TargetDescriptor::unbounded(BlockPosition::new(0, 0, 0), |pos| {
            (pos == BlockPosition::new(100, 0, 0)).then_some(STONE)
        });
        let planner = DiffPlanner::default();

        assert!(planner.plan(&target, &world, &mut catalog(), None).unwrap().is_empty());

        let near = planner
            .plan(&target, &world, &mut catalog(), Some(BlockPosition::new(98, 0, 0)))
            .unwrap();
        assert_eq!(near.len(), 1);
    }

    #[test]
    fn test_bounded_skips_unloaded_cells() {
        let world = TestWorld::new();
        let unloaded = BlockPosition::new(1, 0, 0);
        world.unload(unloaded);

        let grid = VoxelGrid::filled([3, 1, 1], STONE);
        let target = TargetDescriptor::bounded(grid, BlockPosition::new(0, 0, 0));
        let plan = DiffPlanner::default()
            .plan(&target, &world, &mut catalog(), None)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert!(plan.actions().iter().all(|a| a.position() != unloaded));
    }

    #[test]
    fn test_unbounded_skips_unloaded_cells() {
        let world = TestWorld::new();
        let center = BlockPosition::new(0, 0, 0);
        let unloaded = center.offset(1, 0, 0);
        world.unload(unloaded);

        let target = TargetDescriptor::unbounded(center, move |pos| {
            (pos.y == 0 && pos.z == 0 && pos.x.abs() <= 1).then_some(STONE)
        });
        let plan = DiffPlanner::default()
            .plan(&target, &world, &mut catalog(), None)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert!(plan.actions().iter().all(|a| a.position() != unloaded));
    }

    #[test]
    fn test_unbounded_ignores_unknown_states_without_opinion() {
        let world = TestWorld::new();
        world.set(BlockPosition::new(2, 0, 0), 999);

        let target = TargetDescriptor::unbounded(BlockPosition::new(0, 0, 0), |pos| {
            (pos == BlockPosition::new(0, 0, 0)).then_some(STONE)
        });
        let plan = DiffPlanner::default()
            .plan(&target, &world, &mut catalog(), None)
            .unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_unknown_state_propagates() {
        let world = TestWorld::new();
        assert!(DiffPlanner::default()
            .plan(&single(999), &world, &mut catalog(), None)
            .is_err());
    }
}
