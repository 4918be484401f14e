//! Simulation configuration with documented constants
//!
//! Everything a replica must agree on before the first tick lives here.
//! Two replicas with different configs are not expected to stay in sync.

use serde::{Deserialize, Serialize};

use crate::geometry::CELL;

/// Configuration for one simulated world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === RANDOM STREAMS ===
    /// Seed of the synchronized gameplay stream. Must match on every replica.
    pub shared_seed: u64,

    /// Seed of the cosmetic stream. May differ between replicas.
    pub cosmetic_seed: u64,

    // === MAP ===
    /// Map width in world units (1024 per cell)
    ///
    /// Missiles leaving the map detonate, impacts outside it are discarded.
    pub map_width: i32,

    /// Map height in world units (1024 per cell)
    pub map_height: i32,

    // === SPATIAL INDEX ===
    /// Bucket size of the actor index in world units
    ///
    /// Roughly the typical warhead spread. Smaller buckets mean more lookups
    /// per query, larger buckets mean more candidates to filter.
    pub spatial_cell_size: i32,

    // === PROJECTILES ===
    /// Uniform draws summed per inaccuracy axis
    ///
    /// 1 gives a flat distribution, 2 a triangle, higher values approach a bell curve.
    pub inaccuracy_samples: u32,

    // === SAFETY ===
    /// Upper bound on frame-end tasks drained in one flush
    ///
    /// Only a callback that keeps re-enqueueing itself can hit this.
    pub max_frame_end_tasks: usize,

    // === DEBUG ===
    /// "Combat geometry" overlay: impacts are vetoed while it is on
    pub combat_geometry_debug: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            shared_seed: 0,
            cosmetic_seed: 0x5eed,
            map_width: 128 * CELL,
            map_height: 128 * CELL,
            spatial_cell_size: 4 * CELL,
            inaccuracy_samples: 2,
            max_frame_end_tasks: 1 << 20,
            combat_geometry_debug: false,
        }
    }
}

impl SimulationConfig {
    /// Default config with the given synchronized seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            shared_seed: seed,
            ..Self::default()
        }
    }

    /// Parse from TOML, missing keys fall back to defaults
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.map_width <= 0 || self.map_height <= 0 {
            return Err(format!(
                "map size must be positive, got {}x{}",
                self.map_width, self.map_height
            ));
        }
        if self.spatial_cell_size <= 0 {
            return Err("spatial_cell_size must be positive".into());
        }
        if self.inaccuracy_samples == 0 {
            return Err("inaccuracy_samples must be at least 1".into());
        }
        if self.max_frame_end_tasks == 0 {
            return Err("max_frame_end_tasks must be at least 1".into());
        }
        Ok(())
    }
}
