//! In-memory block registry.

use super::{strip_namespace, BlockDescriptor, BlockRegistry, Item};
use crate::error::Result;
use crate::types::StateId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A block registry backed by explicit tables.
///
/// Useful when block data is exported from another tool as JSON:
///
/// ```
/// use voxel_builder::catalog::{BlockRegistry, StaticRegistry};
///
/// let registry = StaticRegistry::from_json(r#"{
///     "blocks": { "1": { "name": "minecraft:stone" } },
///     "items": [{ "id": 1, "name": "stone" }]
/// }"#).unwrap();
/// assert_eq!(registry.item_by_name("stone").map(|i| i.id), Some(1));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticRegistry {
    #[serde(default)]
    blocks: HashMap<StateId, BlockDescriptor>,
    #[serde(default)]
    items: Vec<Item>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a state id.
    pub fn with_block(mut self, id: StateId, descriptor: BlockDescriptor) -> Self {
        self.blocks.insert(id, descriptor);
        self
    }

    /// Add an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Get the total number of state ids.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl BlockRegistry for StaticRegistry {
    fn describe(&self, state: StateId) -> Option<BlockDescriptor> {
        self.blocks.get(&state).cloned()
    }

    fn item_by_name(&self, name: &str) -> Option<Item> {
        let name = strip_namespace(name);
        self.items
            .iter()
            .find(|item| strip_namespace(&item.name) == name)
            .cloned()
    }
}
