//! Applied aura holders
//!
//! One holder exists per (target, caster, spell). Overlapping area effects of
//! the same spell and caster share it, each attaching its own effect index.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EffectIndex, EntityId, Millis, SpellId};

/// Aura applied to a target by one caster's spell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraHolder {
    pub spell: SpellId,
    pub caster: EntityId,
    pub target: EntityId,
    /// Attached effect indices, one bit each
    pub effects: u8,
    /// Remaining time; negative means permanent
    pub duration_ms: i32,
}

impl AuraHolder {
    pub fn new(spell: SpellId, caster: EntityId, target: EntityId, duration_ms: Millis) -> Self {
        Self {
            spell,
            caster,
            target,
            effects: 0,
            duration_ms: duration_ms.min(i32::MAX as Millis) as i32,
        }
    }

    pub fn has_effect(&self, effect: EffectIndex) -> bool {
        self.effects & effect.mask() != 0
    }

    pub fn attach(&mut self, effect: EffectIndex) {
        self.effects |= effect.mask();
    }

    pub fn is_permanent(&self) -> bool {
        self.duration_ms < 0
    }

    /// Extend to `duration_ms` if strictly longer; permanent auras are left alone
    pub fn extend_to(&mut self, duration_ms: Millis) -> bool {
        if self.is_permanent() || (self.duration_ms as Millis) >= duration_ms {
            return false;
        }
        self.duration_ms = duration_ms.min(i32::MAX as Millis) as i32;
        true
    }
}

/// Every aura holder in the world, keyed by target
#[derive(Debug, Clone, Default)]
pub struct AuraStore {
    by_target: AHashMap<EntityId, Vec<AuraHolder>>,
}

impl AuraStore {
    pub fn get(&self, target: EntityId, spell: SpellId, caster: EntityId) -> Option<&AuraHolder> {
        self.by_target
            .get(&target)?
            .iter()
            .find(|h| h.spell == spell && h.caster == caster)
    }

    pub fn get_mut(&mut self, target: EntityId, spell: SpellId, caster: EntityId) -> Option<&mut AuraHolder> {
        self.by_target
            .get_mut(&target)?
            .iter_mut()
            .find(|h| h.spell == spell && h.caster == caster)
    }

    pub fn insert(&mut self, holder: AuraHolder) {
        self.by_target.entry(holder.target).or_default().push(holder);
    }

    /// Auras currently on `target`
    pub fn on_target(&self, target: EntityId) -> &[AuraHolder] {
        self.by_target.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Detach one effect; returns the holder if that was its last effect
    pub fn remove_effect(
        &mut self,
        target: EntityId,
        spell: SpellId,
        caster: EntityId,
        effect: EffectIndex,
    ) -> Option<AuraHolder> {
        let holders = self.by_target.get_mut(&target)?;
        let i = holders.iter().position(|h| h.spell == spell && h.caster == caster)?;
        holders[i].effects &= !effect.mask();
        if holders[i].effects != 0 {
            return None;
        }
        let removed = holders.swap_remove(i);
        if holders.is_empty() {
            self.by_target.remove(&target);
        }
        Some(removed)
    }

    /// Count down every timed aura; returns the ones that ran out
    pub fn tick(&mut self, diff_ms: Millis) -> Vec<AuraHolder> {
        let diff = diff_ms.min(i32::MAX as Millis) as i32;
        let mut expired = Vec::new();
        self.by_target.retain(|_, holders| {
            holders.retain_mut(|h| {
                if h.is_permanent() {
                    return true;
                }
                h.duration_ms -= diff;
                if h.duration_ms <= 0 {
                    expired.push(h.clone());
                    false
                } else {
                    true
                }
            });
            !holders.is_empty()
        });
        expired
    }

    /// Strip every aura from `target`
    pub fn remove_target(&mut self, target: EntityId) -> Vec<AuraHolder> {
        self.by_target.remove(&target).unwrap_or_default()
    }

    /// Drop everything on, or cast by, an entity leaving the world
    pub fn remove_entity(&mut self, id: EntityId) {
        self.by_target.remove(&id);
        self.by_target.retain(|_, holders| {
            holders.retain(|h| h.caster != id);
            !holders.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (EntityId, EntityId) {
        (EntityId::new(1, 0), EntityId::new(2, 0))
    }

    #[test]
    fn test_extend_only_when_longer() {
        let (caster, target) = ids();
        let mut holder = AuraHolder::new(SpellId(5), caster, target, 5000);
        assert!(!holder.extend_to(5000));
        assert!(!holder.extend_to(3000));
        assert!(holder.extend_to(8000));
        assert_eq!(holder.duration_ms, 8000);
    }

    #[test]
    fn test_permanent_is_never_extended() {
        let (caster, target) = ids();
        let mut holder = AuraHolder::new(SpellId(5), caster, target, 0);
        holder.duration_ms = -1;
        assert!(!holder.extend_to(10_000));
    }

    #[test]
    fn test_tick_expires_timed_auras() {
        let (caster, target) = ids();
        let mut store = AuraStore::default();
        store.insert(AuraHolder::new(SpellId(5), caster, target, 100));
        let mut permanent = AuraHolder::new(SpellId(6), caster, target, 0);
        permanent.duration_ms = -1;
        store.insert(permanent);

        assert!(store.tick(50).is_empty());
        let expired = store.tick(50);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].spell, SpellId(5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_removing_last_effect_drops_holder() {
        let (caster, target) = ids();
        let mut store = AuraStore::default();
        let mut holder = AuraHolder::new(SpellId(5), caster, target, 1000);
        holder.attach(EffectIndex(0));
        holder.attach(EffectIndex(1));
        store.insert(holder);

        assert!(store.remove_effect(target, SpellId(5), caster, EffectIndex(0)).is_none());
        assert!(store.get(target, SpellId(5), caster).is_some());
        assert!(store.remove_effect(target, SpellId(5), caster, EffectIndex(1)).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_entity_drops_cast_auras() {
        let (caster, target) = ids();
        let mut store = AuraStore::default();
        store.insert(AuraHolder::new(SpellId(5), caster, target, 1000));
        store.remove_entity(caster);
        assert!(store.is_empty());
    }
}
