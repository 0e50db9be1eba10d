//! Behavior archetypes used to pick a controller for a spawned creature

use serde::{Deserialize, Serialize};

use crate::entity::template::CreatureTemplate;

/// Which behavior implementation drives an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Plain creature controller: aggro on sight, flee, retreat, assist
    Default,
    /// Town guard - also defends friendlies that are being attacked
    Guard,
    /// Script-registered behavior, looked up by id
    Custom(u32),
}

impl Default for Archetype {
    fn default() -> Self {
        Self::Default
    }
}

impl Archetype {
    /// Most specific archetype permitted for a template
    pub fn for_template(template: &CreatureTemplate) -> Self {
        if template.flags.guard {
            Self::Guard
        } else {
            Self::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FactionId;
    use crate::entity::template::CreatureFlags;

    #[test]
    fn test_guard_flag_selects_guard() {
        let template = CreatureTemplate::new(1, "Stormwind Guard", FactionId(1))
            .with_flags(CreatureFlags { guard: true, ..Default::default() });
        assert_eq!(Archetype::for_template(&template), Archetype::Guard);
    }

    #[test]
    fn test_plain_template_selects_default() {
        let template = CreatureTemplate::new(2, "Kobold Miner", FactionId(2));
        assert_eq!(Archetype::for_template(&template), Archetype::Default);
    }
}
