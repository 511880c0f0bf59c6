//! Executes a build plan one action at a time.
//!
//! Each cycle polls the pause/stop signal, picks the cheapest available action
//! and runs it through explicit phases (navigate, equip, place or dig,
//! verify). Only a missing material ends a session early; every other failure
//! is contained to the action that caused it.

pub mod actuator;

pub use actuator::{Actuator, ActuatorError, BreakGoal, Goal, PlaceGoal, PlaceOptions};

use crate::build::Build;
use crate::catalog::Item;
use crate::error::{BuilderError, Result};
use crate::plan::{face_and_ref, Action};
use crate::types::{BlockPosition, StateId};
use crate::world::WorldView;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Eye height above the block the actuator stands in.
const EYE_OFFSET: Vec3 = Vec3::new(0.5, 1.6, 0.5);

/// Tunables for a build session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Distance from which blocks are placed and dug.
    pub range: f32,
    /// Maximum distance from the eye to the clicked point.
    pub reach: f32,
    /// Require line of sight to the clicked face.
    pub line_of_sight: bool,
    /// Abort once an item's count is at or below this.
    pub material_min: u32,
    /// Cost added per block of height above the actuator.
    pub vertical_penalty: f32,
    pub navigation_timeout_base_ms: u64,
    pub navigation_timeout_per_block_ms: u64,
    /// Rejected placements tolerated per position before giving up.
    pub max_place_failures: u32,
    pub rejection_backoff_ms: u64,
    pub busy_backoff_ms: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            range: 3.0,
            reach: 4.5,
            line_of_sight: true,
            material_min: 0,
            vertical_penalty: 100.0,
            navigation_timeout_base_ms: 10_000,
            navigation_timeout_per_block_ms: 1_000,
            max_place_failures: 5,
            rejection_backoff_ms: 100,
            busy_backoff_ms: 500,
        }
    }
}

impl BuildOptions {
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_material_min(mut self, material_min: u32) -> Self {
        self.material_min = material_min;
        self
    }

    /// Deadline for navigating across `distance` blocks.
    pub fn navigation_timeout(&self, distance: f32) -> Duration {
        let per_block = self.navigation_timeout_per_block_ms as f32 * distance.max(0.0);
        Duration::from_millis(self.navigation_timeout_base_ms + per_block.ceil() as u64)
    }
}

/// How a build invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Finished,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildFailure {
    MissingMaterial,
}

/// Detail attached to a build result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildData {
    Failed { error: BuildFailure, item: Item },
    None {},
}

/// Result of a build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub status: BuildStatus,
    pub data: BuildData,
}

impl BuildOutcome {
    pub fn finished() -> Self {
        Self {
            status: BuildStatus::Finished,
            data: BuildData::None {},
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: BuildStatus::Cancel,
            data: BuildData::None {},
        }
    }

    pub fn missing_material(item: Item) -> Self {
        Self {
            status: BuildStatus::Cancel,
            data: BuildData::Failed {
                error: BuildFailure::MissingMaterial,
                item,
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == BuildStatus::Finished
    }

    /// The item that ran out, if that is why the build stopped.
    pub fn missing_item(&self) -> Option<&Item> {
        match &self.data {
            BuildData::Failed { item, .. } => Some(item),
            BuildData::None {} => None,
        }
    }
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Selecting,
    Executing,
    Replanning,
    Paused,
    Done,
    Aborted,
}

const SIGNAL_RUN: u8 = 0;
const SIGNAL_PAUSE: u8 = 1;
const SIGNAL_STOP: u8 = 2;

/// Cloneable handle for pausing or stopping a running build.
///
/// The signal is checked once per cycle, before the next action is selected;
/// an action already in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct BuildControl {
    signal: Arc<AtomicU8>,
}

impl BuildControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Halt after the current action, keeping the plan.
    pub fn pause(&self) {
        self.signal.store(SIGNAL_PAUSE, AtomicOrdering::SeqCst);
    }

    /// Halt after the current action and discard the plan.
    pub fn stop(&self) {
        self.signal.store(SIGNAL_STOP, AtomicOrdering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.signal.load(AtomicOrdering::SeqCst) == SIGNAL_PAUSE
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.load(AtomicOrdering::SeqCst) == SIGNAL_STOP
    }

    fn clear(&self) {
        self.signal.store(SIGNAL_RUN, AtomicOrdering::SeqCst);
    }
}

/// Why a single action did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("missing material: {}", .0.name)]
    MissingMaterial(Item),

    #[error("target unreachable")]
    NavigationUnreachable,

    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("placement rejected: {0}")]
    PlacementRejected(String),

    #[error("must be holding item {0}")]
    MustHold(u32),

    #[error("actuator busy")]
    TransientBusy,

    #[error("{0}")]
    Unclassified(String),
}

impl From<ActuatorError> for ActionError {
    fn from(err: ActuatorError) -> Self {
        match err {
            ActuatorError::NoPath => ActionError::NavigationUnreachable,
            ActuatorError::Timeout => ActionError::NavigationTimeout(Duration::ZERO),
            ActuatorError::Rejected(reason) => ActionError::PlacementRejected(reason),
            ActuatorError::MustHold(item) => ActionError::MustHold(item),
            ActuatorError::Busy => ActionError::TransientBusy,
            ActuatorError::Other(message) => ActionError::Unclassified(message),
        }
    }
}

/// What a cycle achieved.
enum Step {
    /// The world moved closer to the target.
    Progress,
    /// The action was given up on without changing the world.
    Dropped,
    /// Same action will be tried again.
    Retry,
    /// The session must end.
    Abort(Item),
}

/// Caller-supplied ordering of candidate actions.
pub type ActionOrder = Box<dyn Fn(&Action, &Action) -> Ordering + Send + Sync>;

/// Cost of an action seen from `from`: squared distance to the cell center plus
/// a penalty per block of height above `from`. Cells below are favored, so
/// layers complete bottom up.
pub fn action_cost(action: &Action, from: Vec3, vertical_penalty: f32) -> f32 {
    let pos = action.position();
    let distance = pos.center().distance_squared(from);
    distance + (pos.y as f32 - from.y) * vertical_penalty
}

/// Drives build sessions against a world and an actuator.
pub struct Builder<W, A> {
    world: W,
    actuator: A,
    options: BuildOptions,
    order: Option<ActionOrder>,
    control: BuildControl,
    state: SchedulerState,
    current: Option<Build>,
}

impl<W: WorldView, A: Actuator> Builder<W, A> {
    pub fn new(world: W, actuator: A) -> Self {
        Self::with_options(world, actuator, BuildOptions::default())
    }

    pub fn with_options(world: W, actuator: A, options: BuildOptions) -> Self {
        Self {
            world,
            actuator,
            options,
            order: None,
            control: BuildControl::new(),
            state: SchedulerState::Idle,
            current: None,
        }
    }

    /// Replace the distance heuristic with a custom ordering.
    pub fn with_order(
        mut self,
        order: impl Fn(&Action, &Action) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.order = Some(Box::new(order));
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Handle for pausing or stopping from elsewhere.
    pub fn control(&self) -> BuildControl {
        self.control.clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The build kept for `resume`, if any.
    pub fn current_build(&self) -> Option<&Build> {
        self.current.as_ref()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// Run a new build until it finishes, is cancelled, or runs out of material.
    pub async fn build(&mut self, build: Build) -> Result<BuildOutcome> {
        self.current = Some(build);
        self.run().await
    }

    /// Continue the build kept after a pause or a missing material.
    pub async fn resume(&mut self) -> Result<BuildOutcome> {
        if self.current.is_none() {
            tracing::info!("nothing to continue building");
            return Err(BuilderError::NothingToContinue);
        }
        self.run().await
    }

    /// Pause before the next action; the plan is kept.
    pub fn pause(&mut self) {
        tracing::info!("paused building");
        self.control.pause();
        self.state = SchedulerState::Paused;
    }

    /// Discard the current build.
    pub fn stop(&mut self) {
        tracing::info!("stopped building");
        self.control.stop();
        self.current = None;
        self.state = SchedulerState::Idle;
    }

    async fn run(&mut self) -> Result<BuildOutcome> {
        let mut build = self.current.take().ok_or(BuilderError::NothingToContinue)?;
        self.control.clear();

        let outcome = self.drive(&mut build).await;
        if matches!(self.state, SchedulerState::Paused | SchedulerState::Aborted) {
            self.current = Some(build);
        }
        Ok(outcome)
    }

    async fn drive(&mut self, build: &mut Build) -> BuildOutcome {
        let mut replanned = false;

        loop {
            if self.control.is_stopped() {
                tracing::info!("build stopped");
                self.state = SchedulerState::Idle;
                return BuildOutcome::cancelled();
            }
            if self.control.is_paused() {
                tracing::info!(remaining = build.plan().len(), "build paused");
                self.state = SchedulerState::Paused;
                return BuildOutcome::cancelled();
            }

            self.state = SchedulerState::Selecting;
            let mut available = build.available_actions(&self.world);
            tracing::debug!(
                available = available.len(),
                planned = build.plan().len(),
                "selecting"
            );

            if available.is_empty() {
                if build.is_unbounded() && !replanned {
                    self.state = SchedulerState::Replanning;
                    let center = BlockPosition::containing(self.actuator.position());
                    tracing::debug!(%center, "replanning");
                    if let Err(err) = build.replan(&self.world, Some(center)) {
                        tracing::warn!(%center, error = %err, "replanning failed");
                    }
                    replanned = true;
                    continue;
                }
                tracing::info!(unfeasible = build.plan().len(), "finished building");
                self.state = SchedulerState::Done;
                return BuildOutcome::finished();
            }

            self.sort(&mut available);
            let action = available[0];

            self.state = SchedulerState::Executing;
            match self.execute(build, action).await {
                Step::Progress => replanned = false,
                Step::Retry | Step::Dropped => {}
                Step::Abort(item) => {
                    tracing::warn!(item = %item.name, "missing material, aborting build");
                    self.state = SchedulerState::Aborted;
                    return BuildOutcome::missing_material(item);
                }
            }
        }
    }

    fn sort(&self, actions: &mut [Action]) {
        match &self.order {
            Some(order) => actions.sort_by(|a, b| order(a, b)),
            None => {
                let from = self.actuator.position();
                let penalty = self.options.vertical_penalty;
                actions.sort_by(|a, b| {
                    action_cost(a, from, penalty).total_cmp(&action_cost(b, from, penalty))
                });
            }
        }
    }

    async fn execute(&mut self, build: &mut Build, action: Action) -> Step {
        let position = action.position();
        match build.is_satisfied(&action, &self.world) {
            Ok(true) => {
                tracing::debug!(?action, "already satisfied");
                build.plan_mut().remove(&action);
                return Step::Progress;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(%position, error = %err, "cannot check action, dropping it");
                build.plan_mut().discard(&action);
                return Step::Dropped;
            }
        }

        tracing::debug!(?action, "executing");
        let result = match action {
            Action::Dig { position } => self.dig(position).await,
            Action::Place { position, state, .. } => self.place(build, position, state).await,
        };

        let plan = build.plan_mut();
        match result {
            Ok(()) => {
                plan.remove(&action);
                Step::Progress
            }
            Err(ActionError::MissingMaterial(item)) => Step::Abort(item),
            Err(ActionError::NavigationUnreachable) => {
                tracing::info!(%position, "skipping unreachable action");
                plan.discard(&action);
                Step::Dropped
            }
            Err(err @ ActionError::NavigationTimeout(_)) => {
                tracing::info!(%position, error = %err, "skipping action");
                plan.discard(&action);
                Step::Dropped
            }
            Err(ActionError::PlacementRejected(reason)) if !action.is_dig() => {
                let failures = plan.record_failure(position);
                tracing::info!(%position, failures, %reason, "block placement failed");
                if failures > self.options.max_place_failures {
                    tracing::info!(%position, "too many failed place attempts, removing action");
                    plan.discard(&action);
                    Step::Dropped
                } else {
                    let backoff = Duration::from_millis(self.options.rejection_backoff_ms);
                    tokio::time::sleep(backoff).await;
                    Step::Retry
                }
            }
            Err(ActionError::MustHold(item)) => {
                tracing::debug!(%position, item, "not holding the right item, retrying");
                Step::Retry
            }
            Err(ActionError::TransientBusy) => {
                tracing::debug!(%position, "actuator busy, backing off");
                tokio::time::sleep(Duration::from_millis(self.options.busy_backoff_ms)).await;
                Step::Retry
            }
            Err(err) => {
                tracing::warn!(%position, error = %err, "action failed, dropping it");
                plan.discard(&action);
                Step::Dropped
            }
        }
    }

    async fn place(
        &mut self,
        build: &Build,
        position: BlockPosition,
        state: StateId,
    ) -> std::result::Result<(), ActionError> {
        let block = build
            .state(state)
            .ok_or_else(|| ActionError::Unclassified(format!("unresolved state {}", state)))?;
        let item = block
            .item
            .clone()
            .ok_or_else(|| ActionError::Unclassified(format!("no item for {}", block.name)))?;

        let amount = self.actuator.item_count(item.id);
        if amount <= self.options.material_min {
            return Err(ActionError::MissingMaterial(item));
        }
        tracing::debug!(item = %item.name, amount, "selected item");

        let faces = build.directions_for(block, position, &self.world);
        let facing = build.orientation().resolve(block);
        let half = block.properties.half;

        let goal = Goal::Place(PlaceGoal {
            position,
            faces: faces.clone(),
            facing: facing.map(|f| f.facing),
            facing_3d: facing.map_or(false, |f| f.is_3d),
            half,
            range: self.options.range,
            line_of_sight: self.options.line_of_sight,
        });
        self.navigate(&goal).await?;
        self.equip(item.id).await?;

        let eye = BlockPosition::containing(self.actuator.position()).as_vec3() + EYE_OFFSET;
        let target = face_and_ref(position, &faces, half, &self.world, eye, self.options.reach)
            .ok_or_else(|| ActionError::Unclassified("no face and reference in reach".into()))?;

        self.actuator.look_at(target.point).await?;

        let sneak = self
            .world
            .block_at(target.reference)
            .map_or(false, |b| build.interactables().contains(&b.name));
        if sneak {
            self.actuator.set_sneaking(true).await?;
        }
        let placed = self
            .actuator
            .place(
                target.reference,
                target.face,
                PlaceOptions {
                    half,
                    delta: target.delta(),
                },
            )
            .await;
        if sneak {
            self.actuator.set_sneaking(false).await?;
        }
        placed?;

        let actual = self.world.state_at(position);
        if actual != Some(state) {
            tracing::warn!(
                %position,
                expected = state,
                got = ?actual,
                "placed block differs from target"
            );
        }
        Ok(())
    }

    async fn dig(&mut self, position: BlockPosition) -> std::result::Result<(), ActionError> {
        let goal = Goal::Break(BreakGoal {
            position,
            range: self.options.range,
        });
        self.navigate(&goal).await?;

        if let Some(tool) = self.actuator.best_tool(position) {
            self.equip(tool).await?;
        }
        self.actuator.dig(position).await?;
        Ok(())
    }

    async fn navigate(&mut self, goal: &Goal) -> std::result::Result<(), ActionError> {
        let distance = self.actuator.position().distance(goal.position().center());
        let limit = self.options.navigation_timeout(distance);

        match tokio::time::timeout(limit, self.actuator.navigate_to(goal)).await {
            Ok(result) => result.map_err(|err| match err {
                ActuatorError::Timeout => ActionError::NavigationTimeout(limit),
                other => other.into(),
            }),
            Err(_) => Err(ActionError::NavigationTimeout(limit)),
        }
    }

    async fn equip(&mut self, item: u32) -> std::result::Result<(), ActionError> {
        if self.actuator.held_item() == Some(item) {
            return Ok(());
        }
        self.actuator.equip(item).await?;
        Ok(())
    }
}

impl<W, A> std::fmt::Debug for Builder<W, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("building", &self.current.is_some())
            .finish()
    }
}
