//! Fixtures shared by unit tests: a small block registry, an in-memory world
//! and a scripted actuator.

use crate::catalog::{BlockDescriptor, Item, StaticRegistry};
use crate::scheduler::{Actuator, ActuatorError, BuildControl, Goal, PlaceOptions};
use crate::types::{Aabb, BlockPosition, Direction, StateId};
use crate::world::{WorldBlock, WorldView};
use async_trait::async_trait;
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const AIR: StateId = 0;
pub const STONE: StateId = 1;
pub const DIRT: StateId = 2;
pub const LOG_X: StateId = 3;
pub const LOG_Y: StateId = 4;
pub const SLAB_TOP: StateId = 5;
pub const LADDER_NORTH: StateId = 6;
pub const LANTERN_HANGING: StateId = 7;
pub const WHEAT: StateId = 8;
pub const BEDROCK: StateId = 9;
pub const TALL_GRASS_UPPER: StateId = 10;
pub const CHEST: StateId = 11;

fn block_name(state: StateId) -> &'static str {
    match state {
        AIR => "minecraft:air",
        STONE => "minecraft:stone",
        DIRT => "minecraft:dirt",
        LOG_X | LOG_Y => "minecraft:oak_log",
        SLAB_TOP => "minecraft:stone_slab",
        LADDER_NORTH => "minecraft:ladder",
        LANTERN_HANGING => "minecraft:lantern",
        WHEAT => "minecraft:wheat",
        BEDROCK => "minecraft:bedrock",
        TALL_GRASS_UPPER => "minecraft:tall_grass",
        CHEST => "minecraft:chest",
        _ => "minecraft:unknown",
    }
}

/// Registry covering every state above. Item ids equal the state id of the
/// block they place.
pub fn registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new()
        .with_block(AIR, BlockDescriptor::simple(block_name(AIR)))
        .with_block(STONE, BlockDescriptor::simple(block_name(STONE)))
        .with_block(DIRT, BlockDescriptor::simple(block_name(DIRT)))
        .with_block(LOG_X, BlockDescriptor::simple(block_name(LOG_X)).with_property("axis", "x"))
        .with_block(LOG_Y, BlockDescriptor::simple(block_name(LOG_Y)).with_property("axis", "y"))
        .with_block(
            SLAB_TOP,
            BlockDescriptor::simple(block_name(SLAB_TOP)).with_property("type", "top"),
        )
        .with_block(
            LADDER_NORTH,
            BlockDescriptor::simple(block_name(LADDER_NORTH)).with_property("facing", "north"),
        )
        .with_block(
            LANTERN_HANGING,
            BlockDescriptor::simple(block_name(LANTERN_HANGING)).with_property("hanging", "true"),
        )
        .with_block(WHEAT, BlockDescriptor::simple(block_name(WHEAT)).with_material("plant"))
        .with_block(BEDROCK, BlockDescriptor::simple(block_name(BEDROCK)))
        .with_block(
            TALL_GRASS_UPPER,
            BlockDescriptor::simple(block_name(TALL_GRASS_UPPER)).with_property("half", "upper"),
        )
        .with_block(CHEST, BlockDescriptor::simple(block_name(CHEST)));

    for (id, name) in [
        (STONE, "stone"),
        (DIRT, "dirt"),
        (LOG_X, "oak_log"),
        (SLAB_TOP, "stone_slab"),
        (LADDER_NORTH, "ladder"),
        (LANTERN_HANGING, "lantern"),
        (WHEAT, "wheat"),
        (CHEST, "chest"),
    ] {
        registry = registry.with_item(Item {
            id,
            name: name.to_string(),
        });
    }
    registry
}

/// An infinite world of air. Clones share the same cells.
#[derive(Debug, Clone, Default)]
pub struct TestWorld {
    cells: Arc<Mutex<HashMap<BlockPosition, StateId>>>,
    unloaded: Arc<Mutex<HashSet<BlockPosition>>>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pos: BlockPosition, state: StateId) {
        let mut cells = self.cells.lock().unwrap();
        if state == AIR {
            cells.remove(&pos);
        } else {
            cells.insert(pos, state);
        }
    }

    pub fn get(&self, pos: BlockPosition) -> StateId {
        self.cells.lock().unwrap().get(&pos).copied().unwrap_or(AIR)
    }

    /// Make a cell report as not loaded.
    pub fn unload(&self, pos: BlockPosition) {
        self.unloaded.lock().unwrap().insert(pos);
    }

    fn is_loaded(&self, pos: BlockPosition) -> bool {
        !self.unloaded.lock().unwrap().contains(&pos)
    }
}

impl WorldView for TestWorld {
    fn state_at(&self, pos: BlockPosition) -> Option<StateId> {
        self.is_loaded(pos).then(|| self.get(pos))
    }

    fn block_at(&self, pos: BlockPosition) -> Option<WorldBlock> {
        let state = self.state_at(pos)?;
        let shapes = match state {
            AIR | WHEAT | TALL_GRASS_UPPER | LANTERN_HANGING => Vec::new(),
            SLAB_TOP => vec![Aabb::TOP_HALF],
            _ => vec![Aabb::FULL],
        };
        Some(WorldBlock {
            name: block_name(state).to_string(),
            diggable: !matches!(state, AIR | BEDROCK),
            shapes,
        })
    }
}

/// Actuator that edits a [`TestWorld`] directly and can be scripted to fail.
#[derive(Debug)]
pub struct TestActuator {
    pub world: TestWorld,
    pub position: Vec3,
    pub inventory: HashMap<u32, u32>,
    pub held: Option<u32>,
    /// Remaining rejections per placement cell.
    pub rejections: HashMap<BlockPosition, u32>,
    pub must_hold_once: bool,
    pub busy_once: bool,
    pub unreachable: HashSet<BlockPosition>,
    /// Goals whose navigation never finishes.
    pub slow: HashSet<BlockPosition>,
    /// Cells whose dig always fails.
    pub failing_digs: HashSet<BlockPosition>,
    pub control: Option<BuildControl>,
    pub pause_after: Option<usize>,
    pub stop_after: Option<usize>,
    /// Successful places and digs, in order.
    pub done: Vec<(String, BlockPosition)>,
    pub calls: Vec<String>,
}

impl TestActuator {
    pub fn new(world: TestWorld) -> Self {
        Self {
            world,
            position: Vec3::new(0.5, 0.0, 0.5),
            inventory: HashMap::new(),
            held: None,
            rejections: HashMap::new(),
            must_hold_once: false,
            busy_once: false,
            unreachable: HashSet::new(),
            slow: HashSet::new(),
            failing_digs: HashSet::new(),
            control: None,
            pause_after: None,
            stop_after: None,
            done: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: u32, count: u32) -> Self {
        self.inventory.insert(item, count);
        self
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.iter().any(|c| c == call)
    }

    fn finished(&mut self, kind: &str, pos: BlockPosition) {
        self.done.push((kind.to_string(), pos));
        let count = self.done.len();
        if let Some(control) = &self.control {
            if self.pause_after == Some(count) {
                control.pause();
            }
            if self.stop_after == Some(count) {
                control.stop();
            }
        }
    }
}

#[async_trait]
impl Actuator for TestActuator {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn held_item(&self) -> Option<u32> {
        self.held
    }

    fn item_count(&self, item: u32) -> u32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }

    fn best_tool(&self, _pos: BlockPosition) -> Option<u32> {
        None
    }

    async fn equip(&mut self, item: u32) -> Result<(), ActuatorError> {
        self.calls.push(format!("equip({})", item));
        if self.item_count(item) == 0 {
            return Err(ActuatorError::Other(format!("no item {}", item)));
        }
        self.held = Some(item);
        Ok(())
    }

    async fn navigate_to(&mut self, goal: &Goal) -> Result<(), ActuatorError> {
        let target = goal.position();
        self.calls.push(format!("navigate({})", target));
        if self.unreachable.contains(&target) {
            return Err(ActuatorError::NoPath);
        }
        if self.slow.contains(&target) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.position = target.as_vec3() + Vec3::new(0.5, 0.0, 2.5);
        Ok(())
    }

    async fn look_at(&mut self, _point: Vec3) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn set_sneaking(&mut self, sneaking: bool) -> Result<(), ActuatorError> {
        self.calls.push(format!("sneak({})", sneaking));
        Ok(())
    }

    async fn place(
        &mut self,
        reference: BlockPosition,
        face: Direction,
        _options: PlaceOptions,
    ) -> Result<(), ActuatorError> {
        let target = reference.neighbor(face);
        self.calls.push(format!("place({})", target));

        if std::mem::take(&mut self.must_hold_once) {
            return Err(ActuatorError::MustHold(self.held.unwrap_or(0)));
        }
        if std::mem::take(&mut self.busy_once) {
            return Err(ActuatorError::Busy);
        }
        if let Some(remaining) = self.rejections.get_mut(&target) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ActuatorError::Rejected("no block appeared".into()));
            }
        }

        let item = self
            .held
            .ok_or_else(|| ActuatorError::Other("empty hand".into()))?;
        let count = self.inventory.entry(item).or_insert(0);
        if *count == 0 {
            return Err(ActuatorError::Other("out of items".into()));
        }
        *count -= 1;
        self.world.set(target, item);
        self.finished("place", target);
        Ok(())
    }

    async fn dig(&mut self, pos: BlockPosition) -> Result<(), ActuatorError> {
        self.calls.push(format!("dig({})", pos));
        if self.failing_digs.contains(&pos) {
            return Err(ActuatorError::Other("block did not break".into()));
        }
        self.world.set(pos, AIR);
        self.finished("dig", pos);
        Ok(())
    }
}
