//! World configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sizing and timing knobs for a `World`.
///
/// Every field has a default, so a configuration document only needs to name
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Initial number of entity slots.
    pub entity_capacity: usize,
    /// Initial capacity of each system's active set.
    pub active_set_capacity: usize,
    /// Initial number of entity slots in each component column.
    pub column_capacity: usize,
    /// The frame delta a world starts with.
    pub delta: f32,
}

impl WorldConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<WorldConfig> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }
}

impl Default for WorldConfig {
    fn default() -> WorldConfig {
        WorldConfig {
            entity_capacity: 64,
            active_set_capacity: 64,
            column_capacity: 64,
            delta: 0.0,
        }
    }
}
