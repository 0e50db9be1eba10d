//! Per-creature behavior state owned by the controller

use serde::{Deserialize, Serialize};

use crate::core::config::WorldConfig;
use crate::core::types::{EntityId, Millis};
use crate::entity::template::{CreatureFlags, CreatureTemplate};

/// Named state of the controller's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiOrder {
    None,
    /// Running to an ally to fetch help
    Retreating,
    /// Panicking instead of answering a call for help
    FleeFromCallForHelp,
    /// Automatic flee of a flee-on-melee creature
    CritterFlee,
    /// Order owned by a scripted behavior
    Scripted(u32),
}

impl Default for AiOrder {
    fn default() -> Self {
        Self::None
    }
}

/// How eagerly the creature starts fights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactState {
    /// Never attacks, not even back
    Passive,
    /// Fights back but never aggroes on sight
    Defensive,
    Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorState {
    pub order: AiOrder,
    pub react_state: ReactState,
    /// Scripted combat actions are suspended (fleeing, retreating)
    pub combat_script_active: bool,
    /// Sticky: set on the first prevented death
    pub death_prevented: bool,
    pub melee_enabled: bool,
    /// Never moves on its own while fighting
    pub immobilized: bool,
    pub dismount_on_aggro: bool,

    pub visibility_distance: f32,
    pub aggro_radius: f32,
    pub attack_distance: f32,
    pub chase_distance: f32,
    pub attack_angle: f32,

    pub follow_distance: f32,
    pub follow_angle: f32,
    /// Player whose follow slot this creature holds
    pub requested_follower: Option<EntityId>,

    /// Waiting at the ally after a retreat; counts down to the assistance call
    pub retreat_wait_ms: Option<Millis>,
}

impl BehaviorState {
    /// Controller state for a freshly spawned creature
    pub fn for_template(template: &CreatureTemplate, config: &WorldConfig, charmed: bool) -> Self {
        let flags = &template.flags;
        Self {
            order: AiOrder::None,
            react_state: if flags.no_aggro_on_sight {
                ReactState::Defensive
            } else {
                ReactState::Aggressive
            },
            combat_script_active: false,
            death_prevented: false,
            melee_enabled: !flags.flee_on_melee && !flags.no_melee,
            immobilized: flags.sessile,
            dismount_on_aggro: !flags.mounted_combat,
            visibility_distance: Self::sight_distance(flags, config, charmed),
            aggro_radius: template.aggro_radius,
            attack_distance: template.chase_distance,
            chase_distance: template.chase_distance,
            attack_angle: 0.0,
            follow_distance: 0.0,
            follow_angle: 0.0,
            requested_follower: None,
            retreat_wait_ms: None,
        }
    }

    /// Guards and charmed units look further
    pub fn sight_distance(flags: &CreatureFlags, config: &WorldConfig, charmed: bool) -> f32 {
        if flags.guard || charmed {
            config.guard_sight_distance
        } else {
            config.sight_distance
        }
    }

    pub fn has_react_state(&self, state: ReactState) -> bool {
        self.react_state == state
    }
}
