//! Combat state component for units
//!
//! Every unit has combat state (mandatory but minimal).

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

/// Combat state component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatState {
    /// Current melee/spell target
    pub victim: Option<EntityId>,
    /// Accumulated threat per opponent
    pub threat: AHashMap<EntityId, f32>,
    /// Opponents this unit is flagged in combat with
    pub in_combat_with: AHashSet<EntityId>,
    /// Returning home after leaving combat; ignores the world meanwhile
    pub evading: bool,
    /// Suppresses further assistance calls from this unit
    pub no_call_assistance: bool,
}

impl CombatState {
    /// Is this unit actively in combat?
    pub fn in_combat(&self) -> bool {
        !self.in_combat_with.is_empty()
    }

    /// Apply threat (additive)
    pub fn add_threat(&mut self, target: EntityId, amount: f32) {
        *self.threat.entry(target).or_insert(0.0) += amount;
    }

    pub fn has_threat(&self, target: EntityId) -> bool {
        self.threat.contains_key(&target)
    }

    /// Opponent with the highest threat
    pub fn top_threat(&self) -> Option<EntityId> {
        self.threat
            .iter()
            .max_by_key(|(id, amount)| (OrderedFloat(**amount), std::cmp::Reverse(**id)))
            .map(|(id, _)| *id)
    }

    /// Drop every reference to `target`
    pub fn forget(&mut self, target: EntityId) {
        self.threat.remove(&target);
        self.in_combat_with.remove(&target);
        if self.victim == Some(target) {
            self.victim = None;
        }
    }

    /// Leave combat entirely
    pub fn clear(&mut self) {
        self.victim = None;
        self.threat.clear();
        self.in_combat_with.clear();
    }
}
