//! Faction templates and the reactions between them

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;

/// Static faction template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    #[serde(default)]
    pub friendly: Vec<FactionId>,
    #[serde(default)]
    pub hostile: Vec<FactionId>,
    /// Members panic instead of answering a call for help
    #[serde(default)]
    pub flee_from_call_for_help: bool,
}

impl Faction {
    pub fn new(id: FactionId) -> Self {
        Self {
            id,
            friendly: Vec::new(),
            hostile: Vec::new(),
            flee_from_call_for_help: false,
        }
    }

    pub fn hostile_to(mut self, other: FactionId) -> Self {
        self.hostile.push(other);
        self
    }

    pub fn friendly_to(mut self, other: FactionId) -> Self {
        self.friendly.push(other);
        self
    }

    pub fn fleeing_from_calls(mut self) -> Self {
        self.flee_from_call_for_help = true;
        self
    }
}

/// Reaction of one faction towards another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Hostile,
    Neutral,
    Friendly,
}

#[derive(Debug, Clone, Default)]
pub struct FactionTable {
    factions: AHashMap<FactionId, Faction>,
}

impl FactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, faction: Faction) {
        self.factions.insert(faction.id, faction);
    }

    pub fn get(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// Reaction is symmetric: either side listing the other decides it,
    /// hostility taking precedence over friendship.
    pub fn reaction(&self, a: FactionId, b: FactionId) -> Reaction {
        if self.lists_hostile(a, b) || self.lists_hostile(b, a) {
            Reaction::Hostile
        } else if a == b || self.lists_friendly(a, b) || self.lists_friendly(b, a) {
            Reaction::Friendly
        } else {
            Reaction::Neutral
        }
    }

    fn lists_hostile(&self, from: FactionId, to: FactionId) -> bool {
        self.factions
            .get(&from)
            .map(|f| f.hostile.contains(&to))
            .unwrap_or(false)
    }

    fn lists_friendly(&self, from: FactionId, to: FactionId) -> bool {
        self.factions
            .get(&from)
            .map(|f| f.friendly.contains(&to))
            .unwrap_or(false)
    }

    pub fn flees_from_call_for_help(&self, id: FactionId) -> bool {
        self.factions
            .get(&id)
            .map(|f| f.flee_from_call_for_help)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostility_is_symmetric() {
        let mut table = FactionTable::new();
        table.insert(Faction::new(FactionId(1)).hostile_to(FactionId(2)));
        table.insert(Faction::new(FactionId(2)));

        assert_eq!(table.reaction(FactionId(1), FactionId(2)), Reaction::Hostile);
        assert_eq!(table.reaction(FactionId(2), FactionId(1)), Reaction::Hostile);
    }

    #[test]
    fn test_same_faction_is_friendly() {
        let table = FactionTable::new();
        assert_eq!(table.reaction(FactionId(4), FactionId(4)), Reaction::Friendly);
        assert_eq!(table.reaction(FactionId(4), FactionId(5)), Reaction::Neutral);
    }

    #[test]
    fn test_flee_flag_lookup() {
        let mut table = FactionTable::new();
        table.insert(Faction::new(FactionId(9)).fleeing_from_calls());
        assert!(table.flees_from_call_for_help(FactionId(9)));
        assert!(!table.flees_from_call_for_help(FactionId(1)));
    }
}
