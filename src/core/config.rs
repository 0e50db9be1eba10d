//! World configuration with documented tunables
//!
//! The configuration is loaded once (usually from TOML) and handed to the
//! `World` at construction. Nothing in the core reads tunables from global
//! state, so every traversal and behavior function can be exercised in
//! isolation with a hand-built config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::Millis;

/// Tunables read by the spatial, perception and behavior systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === SPATIAL SYSTEM ===
    /// Edge length of one spatial cell (world units)
    ///
    /// Radius queries touch every cell overlapping the query circle, so a
    /// smaller cell means more hash lookups but fewer entities filtered by
    /// exact distance.
    pub grid_cell_size: f32,

    /// Largest combat reach a creature template may carry
    ///
    /// Area-effect queries are padded by this much, so a target whose reach
    /// extends the effective radius is still enumerated.
    pub max_combat_reach: f32,

    // === PERCEPTION ===
    /// Sight distance for ordinary autonomous entities and players
    pub sight_distance: f32,

    /// Sight distance for guards and charmed units
    pub guard_sight_distance: f32,

    // === ASSISTANCE ===
    /// Radius in which idle allies answer a retreating entity's assistance call
    pub assistance_radius: f32,

    /// Radius searched by `DoRetreat` for an ally to run to.
    /// Zero or negative disables retreating entirely.
    pub flee_assistance_radius: f32,

    /// Time a retreated creature waits at the ally before resuming its fight
    pub assistance_delay_ms: Millis,

    // === FLEEING ===
    /// Duration of the automatic flee triggered by flee-on-melee templates
    pub flee_duration_ms: Millis,

    /// Panic duration for factions that flee from a call for help
    pub call_for_help_flee_ms: Millis,

    // === FOLLOWING ===
    /// Distance of the innermost follow slot around a player
    pub follow_distance: f32,

    /// Extra distance added per ring of eight follow slots
    pub follow_ring_spacing: f32,

    // === PARALLELIZATION ===
    /// Minimum number of movers in one tick before the visibility pass
    /// gathers candidates in parallel
    pub parallel_threshold: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: 40.0,
            max_combat_reach: 8.0,

            sight_distance: 50.0,
            guard_sight_distance: 70.0,

            assistance_radius: 10.0,
            flee_assistance_radius: 30.0,
            assistance_delay_ms: 1500,

            flee_duration_ms: 30_000,
            call_for_help_flee_ms: 10_000,

            follow_distance: 1.5,
            follow_ring_spacing: 1.0,

            parallel_threshold: 1000,
        }
    }
}

impl WorldConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WorldConfig = toml::from_str(content)?;
        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.grid_cell_size <= 0.0 {
            return Err(format!(
                "grid_cell_size ({}) must be positive",
                self.grid_cell_size
            ));
        }

        if self.sight_distance <= 0.0 {
            return Err(format!(
                "sight_distance ({}) must be positive",
                self.sight_distance
            ));
        }

        // Guards see at least as far as everyone else
        if self.guard_sight_distance < self.sight_distance {
            return Err(format!(
                "guard_sight_distance ({}) should be >= sight_distance ({})",
                self.guard_sight_distance, self.sight_distance
            ));
        }

        if self.assistance_radius < 0.0 || self.max_combat_reach < 0.0 {
            return Err("Radii must not be negative".into());
        }

        Ok(())
    }

    /// Largest distance any perception query will ever scan
    pub fn max_sight_distance(&self) -> f32 {
        self.sight_distance.max(self.guard_sight_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flee_duration_ms, 30_000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WorldConfig::from_toml_str("sight_distance = 30.0\n").unwrap();
        assert_eq!(config.sight_distance, 30.0);
        assert_eq!(config.assistance_delay_ms, 1500);
    }

    #[test]
    fn test_guard_sight_must_not_shrink() {
        let result = WorldConfig::from_toml_str(
            "sight_distance = 60.0\nguard_sight_distance = 20.0\n",
        );
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let result = WorldConfig::from_toml_str("sight_distance = [");
        assert!(matches!(result, Err(SimError::TomlError(_))));
    }
}
