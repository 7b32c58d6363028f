use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::error::{ConfigError, TerrainError};

/// Tuning constants for graph construction, route queries and resource
/// clustering. Fixed for the lifetime of a scenario: changing them requires a
/// full rebuild of the analysis.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    // Graph construction
    /// Macro-block edge used to chunk unwalkable blobs.
    pub unwalkable_region_size: i32,
    /// Macro-block edge ordering walkable seeds; also scales the A* heuristic,
    /// the gate pairing radius and the cleanup size threshold.
    pub walkable_region_size: i32,
    /// Longest gate line, in chebyshev cells.
    pub gate_threshold: i32,

    // Route queries
    pub max_path_count: usize,
    /// Weight added to each node of a found path when searching alternatives.
    pub path_inflation: u64,
    pub bridge_attempts: usize,

    // Resource clusters
    pub resource_cluster_size: i32,
    pub resource_cluster_max_mineral_cells: usize,
    pub wood_per_tree: u32,
    /// Wood-only clusters are kept only when their wood amount exceeds this.
    pub min_cluster_wood: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            unwalkable_region_size: 4,
            walkable_region_size: 10,
            gate_threshold: 10,
            max_path_count: 10,
            path_inflation: 100,
            bridge_attempts: 3,
            resource_cluster_size: 8,
            resource_cluster_max_mineral_cells: 16,
            wood_per_tree: 10,
            min_cluster_wood: 50,
        }
    }
}

impl TerrainConfig {
    /// Read and parse a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str::<TerrainConfig>(&contents)?)
    }

    /// Load a RON config, logging and falling back to defaults on failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded terrain config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to load terrain config {}: {}", path.display(), e);
                error!("Using default TerrainConfig");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        let sizes = [
            ("unwalkable_region_size", self.unwalkable_region_size),
            ("walkable_region_size", self.walkable_region_size),
            ("resource_cluster_size", self.resource_cluster_size),
        ];
        for (name, value) in sizes {
            if value <= 0 {
                return Err(TerrainError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.gate_threshold < 0 {
            return Err(TerrainError::InvalidConfig("gate_threshold must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config: TerrainConfig = ron::from_str("(gate_threshold: 6, max_path_count: 3)").unwrap();
        assert_eq!(config.gate_threshold, 6);
        assert_eq!(config.max_path_count, 3);
        assert_eq!(config.walkable_region_size, 10);
        assert_eq!(config.path_inflation, 100);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = TerrainConfig::load_or_default("definitely/not/here.ron");
        assert_eq!(config, TerrainConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_block_size() {
        let config = TerrainConfig { walkable_region_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));
        assert!(TerrainConfig::default().validate().is_ok());
    }
}
