//! Archetype → behavior lookup

use std::sync::Arc;

use ahash::AHashMap;

use crate::behavior::controller::{CreatureBehavior, DefaultBehavior};
use crate::behavior::guard::GuardBehavior;
use crate::entity::Archetype;

pub type SharedBehavior = Arc<dyn CreatureBehavior>;

/// Behavior implementations shared by every creature of an archetype
pub struct BehaviorRegistry {
    behaviors: AHashMap<Archetype, SharedBehavior>,
    fallback: SharedBehavior,
}

impl BehaviorRegistry {
    /// Registry without any archetype mapped; everything runs the default
    pub fn empty() -> Self {
        Self {
            behaviors: AHashMap::new(),
            fallback: Arc::new(DefaultBehavior),
        }
    }

    pub fn register(&mut self, archetype: Archetype, behavior: SharedBehavior) {
        tracing::debug!("registered {} behavior for {:?}", behavior.name(), archetype);
        self.behaviors.insert(archetype, behavior);
    }

    /// Behavior for `archetype`; unknown archetypes get the default controller
    pub fn get(&self, archetype: Archetype) -> SharedBehavior {
        self.behaviors
            .get(&archetype)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn contains(&self, archetype: Archetype) -> bool {
        self.behaviors.contains_key(&archetype)
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Archetype::Default, Arc::new(DefaultBehavior));
        registry.register(Archetype::Guard, Arc::new(GuardBehavior));
        registry
    }
}
