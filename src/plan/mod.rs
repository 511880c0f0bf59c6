//! Action plans and the diff planner that builds them.
//!
//! A plan is the list of digs and placements that would turn the world into
//! the target. It is built by [`DiffPlanner`] and consumed one action at a
//! time by the scheduler.

pub mod feasibility;
pub mod planner;
pub mod target;

pub use feasibility::{attachment_directions, candidate_directions, face_and_ref, FaceAndRef};
pub use planner::{DiffPlanner, PlannerConfig};
pub use target::{Blueprint, Generator, TargetDescriptor, VoxelGrid};

use crate::catalog::{BlockCatalog, OrientationTable};
use crate::types::{BlockPosition, StateId};
use crate::world::WorldView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single step toward the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Break the block at `position`.
    Dig { position: BlockPosition },
    /// Place `state` at `position`, after the dig at `depends_on` if any.
    Place {
        position: BlockPosition,
        state: StateId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depends_on: Option<BlockPosition>,
    },
}

impl Action {
    pub fn position(&self) -> BlockPosition {
        match self {
            Action::Dig { position } | Action::Place { position, .. } => *position,
        }
    }

    pub fn is_dig(&self) -> bool {
        matches!(self, Action::Dig { .. })
    }
}

/// How strictly an existing block must match the desired one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMatchStrictness {
    /// Same block type, properties ignored.
    #[default]
    SameName,
    /// Same state id.
    SameState,
}

/// Which differences between world and target produce actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Dig cells that should be empty but are not.
    pub break_target_should_be_air: bool,
    /// Dig and replace solid cells holding the wrong block.
    pub break_target_should_be_different: bool,
    /// Place into cells that are currently empty.
    pub place_target_is_air: bool,
    pub block_match_strictness: BlockMatchStrictness,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            break_target_should_be_air: true,
            break_target_should_be_different: true,
            place_target_is_air: true,
            block_match_strictness: BlockMatchStrictness::SameName,
        }
    }
}

impl MatchPolicy {
    pub fn with_strictness(mut self, strictness: BlockMatchStrictness) -> Self {
        self.block_match_strictness = strictness;
        self
    }
}

/// Pending actions plus the bookkeeping for cells that keep failing.
#[derive(Debug, Clone, Default)]
pub struct ActionPlan {
    actions: Vec<Action>,
    failures: HashMap<BlockPosition, u32>,
}

impl ActionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action. A plan holds at most one dig and one placement per
    /// position; duplicates are ignored.
    pub fn push(&mut self, action: Action) -> bool {
        let position = action.position();
        let duplicate = self
            .actions
            .iter()
            .any(|a| a.position() == position && a.is_dig() == action.is_dig());
        if duplicate {
            return false;
        }
        self.actions.push(action);
        true
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }

    /// Remove an action, returning whether it was present.
    pub fn remove(&mut self, action: &Action) -> bool {
        match self.actions.iter().position(|a| a == action) {
            Some(index) => {
                self.actions.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove an action that could not be carried out.
    ///
    /// Dropping a dig also drops the placement waiting on it, which would
    /// otherwise click into an occupied cell. Returns the number of actions
    /// removed.
    pub fn discard(&mut self, action: &Action) -> usize {
        let before = self.actions.len();
        self.remove(action);
        if let Action::Dig { position } = action {
            self.actions.retain(|a| {
                !matches!(a, Action::Place { depends_on: Some(dep), .. } if dep == position)
            });
        }
        before - self.actions.len()
    }

    pub fn has_dig_at(&self, position: BlockPosition) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, Action::Dig { position: p } if *p == position))
    }

    /// Count a failed placement at `position`, returning the new count.
    pub fn record_failure(&mut self, position: BlockPosition) -> u32 {
        let count = self.failures.entry(position).or_insert(0);
        *count += 1;
        *count
    }

    pub fn failure_count(&self, position: BlockPosition) -> u32 {
        self.failures.get(&position).copied().unwrap_or(0)
    }

    /// Carry placement failure counters over from a previous plan.
    ///
    /// Actions are never carried over. A position that already used up its
    /// rejection budget gets one more attempt in the new plan.
    pub fn inherit(&mut self, previous: &ActionPlan) {
        self.failures.extend(previous.failures.iter().map(|(k, v)| (*k, *v)));
    }

    /// Actions that can be executed right now.
    ///
    /// Digs are always available. A placement is available once its
    /// dependency has been dug and at least one neighbor offers an attachment
    /// face.
    pub fn available_actions(
        &self,
        catalog: &BlockCatalog,
        orientation: &OrientationTable,
        world: &dyn WorldView,
    ) -> Vec<Action> {
        self.actions
            .iter()
            .filter(|action| match action {
                Action::Dig { .. } => true,
                Action::Place {
                    position,
                    state,
                    depends_on,
                } => {
                    if let Some(dep) = depends_on {
                        if self.has_dig_at(*dep) {
                            return false;
                        }
                    }
                    match catalog.get(*state) {
                        Some(block) => {
                            !attachment_directions(block, orientation, *position, world).is_empty()
                        }
                        None => {
                            tracing::warn!(state, %position, "placement for unresolved state");
                            false
                        }
                    }
                }
            })
            .copied()
            .collect()
    }
}
