//! A build session: target, plan and the per-session block tables.

use crate::catalog::{
    BlockCatalog, BlockRegistry, BlockState, InteractableSet, Item, OrientationTable,
};
use crate::error::Result;
use crate::plan::{
    attachment_directions, Action, ActionPlan, BlockMatchStrictness, DiffPlanner, TargetDescriptor,
};
use crate::types::{BlockPosition, Direction, StateId};
use crate::world::WorldView;

/// Everything needed to bring one target into the world.
///
/// The plan is computed on construction. The block catalog, orientation table
/// and interactable set live here so that nothing is shared between sessions.
#[derive(Debug)]
pub struct Build {
    target: TargetDescriptor,
    planner: DiffPlanner,
    catalog: BlockCatalog,
    orientation: OrientationTable,
    interactables: InteractableSet,
    plan: ActionPlan,
}

impl Build {
    /// Create a build with the default match policy.
    pub fn new(
        target: TargetDescriptor,
        world: &dyn WorldView,
        registry: impl BlockRegistry + Send + Sync + 'static,
    ) -> Result<Self> {
        Self::with_planner(target, world, registry, DiffPlanner::default())
    }

    pub fn with_planner(
        target: TargetDescriptor,
        world: &dyn WorldView,
        registry: impl BlockRegistry + Send + Sync + 'static,
        planner: DiffPlanner,
    ) -> Result<Self> {
        let mut build = Self {
            target,
            planner,
            catalog: BlockCatalog::new(registry),
            orientation: OrientationTable::load()?,
            interactables: InteractableSet::load()?,
            plan: ActionPlan::new(),
        };
        build.replan(world, None)?;
        tracing::info!(actions = build.plan.len(), target = ?build.target, "build created");
        Ok(build)
    }

    /// Replace the plan with a fresh diff.
    ///
    /// Unbounded targets are searched around `center`. Only placement failure
    /// counters carry over; previously dropped actions are planned again if
    /// the world still differs.
    pub fn replan(&mut self, world: &dyn WorldView, center: Option<BlockPosition>) -> Result<()> {
        let mut fresh = self
            .planner
            .plan(&self.target, world, &mut self.catalog, center)?;
        fresh.inherit(&self.plan);
        self.plan = fresh;
        Ok(())
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    pub fn is_unbounded(&self) -> bool {
        self.target.is_unbounded()
    }

    pub fn plan(&self) -> &ActionPlan {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut ActionPlan {
        &mut self.plan
    }

    pub fn orientation(&self) -> &OrientationTable {
        &self.orientation
    }

    pub fn interactables(&self) -> &InteractableSet {
        &self.interactables
    }

    /// Actions executable against the current world.
    pub fn available_actions(&self, world: &dyn WorldView) -> Vec<Action> {
        self.plan
            .available_actions(&self.catalog, &self.orientation, world)
    }

    /// A state resolved during planning.
    pub fn state(&self, id: StateId) -> Option<&BlockState> {
        self.catalog.get(id)
    }

    /// The item needed to place a state.
    pub fn item_for_state(&self, id: StateId) -> Option<&Item> {
        self.catalog.get(id).and_then(|s| s.item.as_ref())
    }

    /// Attachment directions for placing `state` at `pos` right now.
    pub fn directions_for(
        &self,
        state: &BlockState,
        pos: BlockPosition,
        world: &dyn WorldView,
    ) -> Vec<Direction> {
        attachment_directions(state, &self.orientation, pos, world)
    }

    /// Whether the world already reflects what `action` would do.
    pub fn is_satisfied(&mut self, action: &Action, world: &dyn WorldView) -> Result<bool> {
        let Some(actual) = world.state_at(action.position()) else {
            return Ok(false);
        };
        match action {
            Action::Dig { .. } => Ok(self.catalog.resolve(actual)?.is_air()),
            Action::Place { state, .. } => {
                if actual == *state {
                    return Ok(true);
                }
                match self.planner.policy().block_match_strictness {
                    BlockMatchStrictness::SameState => Ok(false),
                    BlockMatchStrictness::SameName => {
                        let actual_name = self.catalog.resolve(actual)?.name.clone();
                        Ok(self.catalog.resolve(*state)?.name == actual_name)
                    }
                }
            }
        }
    }
}
