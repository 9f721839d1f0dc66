use crate::codec::ListPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use worldbridge_common::{BridgeError, Result};

/// Adapter settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Overrides the data version the binding expects.
    pub expected_data_version: Option<i32>,
    pub list_policy: ListPolicy,
    pub regen_temp_prefix: String,
    /// Extra chunks generated around a regenerated region on each side.
    pub regen_halo_chunks: u32,
    /// Host tasks drained per cooperative-wait iteration.
    pub regen_pump_budget: u32,
    pub stamp_block_entity_id: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            expected_data_version: None,
            list_policy: ListPolicy::Degrade,
            regen_temp_prefix: "worldbridge-regen".to_owned(),
            regen_halo_chunks: 1,
            regen_pump_budget: 64,
            stamp_block_entity_id: true,
        }
    }
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::ConfigError(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
