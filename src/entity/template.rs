//! Static creature templates
//!
//! Templates are loaded by the persistence layer; this module only describes
//! their shape so the core can read flags and tunables from them.

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, TemplateEntry};
use crate::entity::vehicle::SeatFlags;

/// Static flags copied onto each spawned creature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureFlags {
    /// Cannot be killed by ordinary damage; lethal hits are clamped
    pub unkillable: bool,
    /// Runs away from player-controlled attackers instead of meleeing
    pub flee_on_melee: bool,
    /// Never moves on its own
    pub sessile: bool,
    /// Never swings in melee
    pub no_melee: bool,
    /// Does not aggro on sight (starts defensive)
    pub no_aggro_on_sight: bool,
    /// Keeps its mount while fighting
    pub mounted_combat: bool,
    pub guard: bool,
    pub civilian: bool,
    pub totem: bool,
}

/// Static definition a creature is spawned from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub entry: TemplateEntry,
    pub name: String,
    pub faction: FactionId,
    #[serde(default = "default_health")]
    pub max_health: u32,
    #[serde(default = "default_combat_reach")]
    pub combat_reach: f32,
    /// Distance at which an aggressive creature attacks what it sees
    #[serde(default = "default_aggro_radius")]
    pub aggro_radius: f32,
    /// Preferred melee chase distance
    #[serde(default)]
    pub chase_distance: f32,
    #[serde(default)]
    pub flags: CreatureFlags,
    /// Seats, when the creature is a vehicle
    #[serde(default)]
    pub seats: Vec<SeatFlags>,
}

fn default_health() -> u32 {
    100
}

fn default_combat_reach() -> f32 {
    1.5
}

fn default_aggro_radius() -> f32 {
    20.0
}

impl CreatureTemplate {
    pub fn new(entry: u32, name: &str, faction: FactionId) -> Self {
        Self {
            entry: TemplateEntry(entry),
            name: name.to_string(),
            faction,
            max_health: default_health(),
            combat_reach: default_combat_reach(),
            aggro_radius: default_aggro_radius(),
            chase_distance: 0.0,
            flags: CreatureFlags::default(),
            seats: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: CreatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_seats(mut self, seats: Vec<SeatFlags>) -> Self {
        self.seats = seats;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_from_toml_uses_defaults() {
        let toml_str = r#"
            entry = 3100
            name = "Timber Wolf"
            faction = 7

            [flags]
            flee_on_melee = true
        "#;
        let template: CreatureTemplate = toml::from_str(toml_str).unwrap();
        assert_eq!(template.entry, TemplateEntry(3100));
        assert_eq!(template.max_health, 100);
        assert!(template.flags.flee_on_melee);
        assert!(!template.flags.guard);
        assert!(template.seats.is_empty());
    }
}
