//! Static spell data read by the area-effect updater

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EffectIndex, SpellId, TemplateEntry};

/// Self-cast by civilians when attacked, summoning nearby guards
pub const CALL_GUARDS: SpellId = SpellId(43783);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellAttributes {
    pub only_on_player: bool,
    pub not_on_player: bool,
    pub not_on_player_controlled_npc: bool,
    /// Goes through spell immunity
    pub no_immunities: bool,
    pub ignore_line_of_sight: bool,
}

/// Kind of entity a script-target entry accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptTargetKind {
    /// Living creature of the entry
    Creature,
    /// Corpse of a creature of the entry
    Dead,
    GameObject,
    GameObjectGuid,
}

/// Explicit target restriction for a spell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptTarget {
    pub kind: ScriptTargetKind,
    pub entry: TemplateEntry,
    /// Effects this entry does not apply to (bit per effect index)
    #[serde(default)]
    pub inhibit_effect_mask: u8,
}

impl ScriptTarget {
    pub fn can_not_hit_with_effect(&self, effect: EffectIndex) -> bool {
        self.inhibit_effect_mask & effect.mask() != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellInfo {
    pub id: SpellId,
    pub name: String,
    #[serde(default)]
    pub attributes: SpellAttributes,
    #[serde(default)]
    pub script_targets: Vec<ScriptTarget>,
}

impl SpellInfo {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id: SpellId(id),
            name: name.to_string(),
            attributes: SpellAttributes::default(),
            script_targets: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: SpellAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_script_target(mut self, target: ScriptTarget) -> Self {
        self.script_targets.push(target);
        self
    }
}

/// All spells known to the world
#[derive(Debug, Clone, Default)]
pub struct SpellBook {
    spells: AHashMap<SpellId, SpellInfo>,
}

impl SpellBook {
    pub fn insert(&mut self, spell: SpellInfo) {
        self.spells.insert(spell.id, spell);
    }

    pub fn get(&self, id: SpellId) -> Option<&SpellInfo> {
        self.spells.get(&id)
    }

    pub fn contains(&self, id: SpellId) -> bool {
        self.spells.contains_key(&id)
    }
}
