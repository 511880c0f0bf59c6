//! Block state catalog and static block tables.
//!
//! The catalog decodes numeric state ids through an external [`BlockRegistry`]
//! and memoizes the result for the lifetime of a build session. The
//! orientation table and interactable set are small static tables shipped as
//! JSON and parsed once per session.

pub mod interactable;
pub mod orientation;
pub mod registry;

pub use interactable::InteractableSet;
pub use orientation::{FacingInfo, OrientationTable, ResolvedFacing};
pub use registry::StaticRegistry;

use crate::error::{BuilderError, Result};
use crate::types::{Axis, Direction, Half, StateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An inventory item associated with a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
}

/// Raw description of a state id as reported by the block registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Block name, e.g., "minecraft:oak_log"
    pub name: String,
    /// Block properties, e.g., {"axis": "y"}
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Material class, e.g., "plant"
    #[serde(default)]
    pub material: Option<String>,
}

impl BlockDescriptor {
    /// A block with no properties and no material class.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            material: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

/// Source of block and item data for a game version.
pub trait BlockRegistry {
    /// Describe a state id, or `None` if the id is unknown.
    fn describe(&self, state: StateId) -> Option<BlockDescriptor>;

    /// Find the inventory item with the given block name.
    fn item_by_name(&self, name: &str) -> Option<Item>;
}

/// Properties of a block state that influence placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockProperties {
    /// Fixed axis of pillar-like blocks.
    pub axis: Option<Axis>,
    /// Vertical half, from either the `half` or the slab `type` property.
    pub half: Option<Half>,
    /// Raw facing, before orientation table inversion.
    pub facing: Option<Direction>,
    pub hanging: bool,
    /// All properties as reported by the registry.
    pub raw: HashMap<String, String>,
}

impl BlockProperties {
    fn parse(raw: HashMap<String, String>) -> Self {
        let axis = raw.get("axis").and_then(|v| Axis::from_str(v));
        let half = raw
            .get("half")
            .or_else(|| raw.get("type"))
            .and_then(|v| Half::from_str(v));
        let facing = raw.get("facing").and_then(|v| Direction::from_str(v));
        let hanging = raw.get("hanging").map(|v| v == "true").unwrap_or(false);

        Self {
            axis,
            half,
            facing,
            hanging,
            raw,
        }
    }
}

/// A fully resolved block state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub id: StateId,
    /// Block name, e.g., "minecraft:stone"
    pub name: String,
    pub properties: BlockProperties,
    pub material: Option<String>,
    /// Item used to place this block, if one exists.
    pub item: Option<Item>,
}

impl BlockState {
    /// Get the block ID without namespace (e.g., "stone").
    pub fn block_id(&self) -> &str {
        strip_namespace(&self.name)
    }

    /// Check if this is an air block.
    pub fn is_air(&self) -> bool {
        matches!(self.block_id(), "air" | "cave_air" | "void_air")
    }

    /// Check if this block must rest on top of another block.
    pub fn is_plant(&self) -> bool {
        self.material.as_deref() == Some("plant")
    }
}

/// Strip a namespace prefix: "minecraft:stone" -> "stone".
pub(crate) fn strip_namespace(name: &str) -> &str {
    name.split_once(':').map(|(_, id)| id).unwrap_or(name)
}

/// Memoized state id lookup.
pub struct BlockCatalog {
    registry: Box<dyn BlockRegistry + Send + Sync>,
    states: HashMap<StateId, BlockState>,
}

impl BlockCatalog {
    pub fn new(registry: impl BlockRegistry + Send + Sync + 'static) -> Self {
        Self {
            registry: Box::new(registry),
            states: HashMap::new(),
        }
    }

    /// Resolve a state id, decoding and caching it on first use.
    pub fn resolve(&mut self, id: StateId) -> Result<&BlockState> {
        if !self.states.contains_key(&id) {
            let state = self.decode(id)?;
            self.states.insert(id, state);
        }
        Ok(&self.states[&id])
    }

    /// Resolve every id in `ids`.
    pub fn warm(&mut self, ids: &[StateId]) -> Result<()> {
        for &id in ids {
            self.resolve(id)?;
        }
        Ok(())
    }

    /// Look up an already resolved state.
    pub fn get(&self, id: StateId) -> Option<&BlockState> {
        self.states.get(&id)
    }

    /// Number of distinct states resolved so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn decode(&self, id: StateId) -> Result<BlockState> {
        let descriptor = self
            .registry
            .describe(id)
            .ok_or(BuilderError::UnknownState(id))?;

        let item = self.registry.item_by_name(strip_namespace(&descriptor.name));
        if item.is_none() {
            tracing::warn!(state = id, block = %descriptor.name, "no item for block");
        }

        Ok(BlockState {
            id,
            name: descriptor.name,
            properties: BlockProperties::parse(descriptor.properties),
            material: descriptor.material,
            item,
        })
    }
}

impl std::fmt::Debug for BlockCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCatalog")
            .field("states", &self.states.len())
            .finish()
    }
}
