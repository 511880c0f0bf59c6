//! Blocks that react to being clicked.
//!
//! Placing against one of these requires sneaking, otherwise the click opens
//! or toggles the block instead of placing.

use super::strip_namespace;
use crate::error::Result;
use std::collections::HashSet;

const INTERACTABLE_DATA: &str = include_str!("../../data/interactable.json");

#[derive(Debug, Clone, Default)]
pub struct InteractableSet {
    names: HashSet<String>,
}

impl InteractableSet {
    /// Load the built-in list.
    pub fn load() -> Result<Self> {
        Self::from_json(INTERACTABLE_DATA)
    }

    /// Parse a JSON array of block ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Ok(Self {
            names: names.into_iter().collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(strip_namespace(name))
    }
}
