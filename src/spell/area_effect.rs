//! Persistent area effects
//!
//! An anchor is a dynamic object carrying one effect of one spell. Every tick
//! the updater walks the units around it and makes sure each eligible one
//! carries the effect, sharing a single aura holder per caster and spell.

use ahash::AHashSet;

use crate::combat::relations::{can_assist, can_attack};
use crate::core::types::{EffectIndex, EntityId, Millis, SpellId, Vec2};
use crate::ecs::world::World;
use crate::entity::{CategoryMask, Entity};
use crate::simulation::events::WorldEvent;
use crate::spatial::visit::{visit_all, RegionQuery};
use crate::spell::aura::AuraHolder;
use crate::spell::info::{ScriptTargetKind, SpellInfo};

/// Anchor state of one persistent area effect
#[derive(Debug, Clone)]
pub struct AreaEffect {
    pub anchor: EntityId,
    pub caster: EntityId,
    pub spell: SpellId,
    pub effect: EffectIndex,
    pub radius: f32,
    pub remaining_ms: Millis,
    /// Beneficial effect: targets allies instead of enemies
    pub positive: bool,
    /// Targets chosen by script; skips the friend/foe relationship test
    pub script_targeted: bool,
    /// Targets already hit once by this anchor
    pub affected: AHashSet<EntityId>,
}

impl AreaEffect {
    pub fn new(caster: EntityId, spell: SpellId, effect: EffectIndex, radius: f32, duration_ms: Millis) -> Self {
        Self {
            anchor: EntityId::new(0, 0),
            caster,
            spell,
            effect,
            radius,
            remaining_ms: duration_ms,
            positive: false,
            script_targeted: false,
            affected: AHashSet::new(),
        }
    }

    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    pub fn script_targeted(mut self) -> Self {
        self.script_targeted = true;
        self
    }

    pub fn is_affecting(&self, target: EntityId) -> bool {
        self.affected.contains(&target)
    }
}

/// Everything the eligibility test reads about the anchor
struct Placement<'a> {
    effect: &'a AreaEffect,
    center: Vec2,
    spell: &'a SpellInfo,
    caster: &'a Entity,
    /// The caster's owner when it has one: GM-hidden players are only hit
    /// when they are this unit
    check_unit: EntityId,
}

/// Does the script target list accept `target` for this effect
fn script_targets_accept(spell: &SpellInfo, effect: EffectIndex, target: &Entity) -> bool {
    for entry in &spell.script_targets {
        if entry.can_not_hit_with_effect(effect) {
            continue;
        }
        if matches!(entry.kind, ScriptTargetKind::GameObject | ScriptTargetKind::GameObjectGuid) {
            continue;
        }
        if target.entry == entry.entry {
            return match entry.kind {
                ScriptTargetKind::Dead => target.is_creature_corpse(),
                ScriptTargetKind::Creature => target.alive,
                _ => false,
            };
        }
    }
    false
}

fn is_eligible(world: &World, placement: &Placement<'_>, target: &Entity) -> bool {
    if !target.alive || target.state.in_transit {
        return false;
    }
    if target.is_creature() && target.is_totem() {
        return false;
    }

    let caster = placement.caster;
    let mut radius = placement.effect.radius;
    if caster.player_controlled && !target.player_controlled {
        // Capped at the query padding so eligibility never reaches past the scan
        radius += target.combat_reach.min(world.config().max_combat_reach);
    }
    if placement.center.distance_sq(&target.position) > radius * radius {
        return false;
    }

    if target.is_in_evade_mode() {
        return false;
    }
    if target.id != placement.check_unit && target.is_hidden_player() {
        return false;
    }

    let spell = placement.spell;
    if !spell.script_targets.is_empty() {
        if !script_targets_accept(spell, placement.effect.effect, target) {
            return false;
        }
    } else if !placement.effect.script_targeted {
        let related = if placement.effect.positive {
            can_assist(world, caster, target)
        } else {
            can_attack(world, caster, target)
        };
        if !related {
            return false;
        }
    }

    let attributes = &spell.attributes;
    if attributes.only_on_player && !target.is_player() {
        return false;
    }
    if attributes.not_on_player && target.is_player() {
        return false;
    }
    if attributes.not_on_player_controlled_npc && target.player_controlled && !target.is_player() {
        return false;
    }
    if !attributes.no_immunities && target.immunities.contains(&spell.id) {
        return false;
    }
    if !attributes.ignore_line_of_sight && !world.line_of_sight().is_clear(placement.center, target.position) {
        return false;
    }

    true
}

/// Attach, refresh or create the aura on `target`, then record the first hit
fn apply(world: &mut World, anchor: EntityId, target: EntityId) {
    let Some(effect) = world.area_effect(anchor) else {
        return;
    };
    let (caster, spell, index, remaining) = (effect.caster, effect.spell, effect.effect, effect.remaining_ms);

    let event = match world.auras_mut().get_mut(target, spell, caster) {
        Some(holder) if !holder.has_effect(index) => {
            holder.attach(index);
            Some(WorldEvent::AuraApplied { target, caster, spell, effect: index })
        }
        Some(holder) => holder
            .extend_to(remaining)
            .then_some(WorldEvent::AuraRefreshed { target, caster, spell, duration_ms: remaining }),
        None => {
            let mut holder = AuraHolder::new(spell, caster, target, remaining);
            holder.attach(index);
            world.auras_mut().insert(holder);
            tracing::debug!("aura {:?} from {} applied to {}", spell, caster, target);
            Some(WorldEvent::AuraApplied { target, caster, spell, effect: index })
        }
    };
    if let Some(event) = event {
        world.emit(event);
    }

    let first_hit = world
        .area_effect_mut(anchor)
        .map(|effect| effect.affected.insert(target))
        .unwrap_or(false);
    if first_hit {
        world.emit(WorldEvent::CasterHitTarget { caster, target, spell });
    }
}

/// One updater pass for a single anchor; returns the number of targets touched
pub fn update_area_effect(world: &mut World, anchor: EntityId) -> usize {
    let query = {
        let (Some(effect), Some(anchor_entity)) = (world.area_effect(anchor), world.get(anchor)) else {
            return 0;
        };
        // Padded so targets whose combat reach extends the radius are enumerated
        RegionQuery::around_entity(anchor_entity, effect.radius + world.config().max_combat_reach)
            .categories(CategoryMask::PLAYERS | CategoryMask::CREATURES)
    };

    let mut touched = 0;
    visit_all(world, &query, |world, target| {
        let eligible = {
            let (Some(effect), Some(anchor_entity), Some(target_entity)) =
                (world.area_effect(anchor), world.get(anchor), world.get(target))
            else {
                return;
            };
            let (Some(caster), Some(spell)) = (world.get(effect.caster), world.spells().get(effect.spell)) else {
                return;
            };
            let placement = Placement {
                effect,
                center: anchor_entity.position,
                spell,
                caster,
                check_unit: caster.owner.unwrap_or(caster.id),
            };
            is_eligible(world, &placement, target_entity)
        };
        if eligible {
            apply(world, anchor, target);
            touched += 1;
        }
    });
    touched
}

/// Run the updater for every active anchor
pub fn update_area_effects(world: &mut World) -> usize {
    let mut anchors = world.area_effect_ids();
    anchors.sort();
    anchors.into_iter().map(|anchor| update_area_effect(world, anchor)).sum()
}

/// Another live anchor of the same caster, spell and effect still holds `target`
fn covered_elsewhere(world: &World, expired: &AreaEffect, target: EntityId) -> bool {
    world.area_effect_ids().into_iter().any(|anchor| {
        world.area_effect(anchor).is_some_and(|other| {
            other.caster == expired.caster
                && other.spell == expired.spell
                && other.effect == expired.effect
                && other.is_affecting(target)
        })
    })
}

/// Count down anchor lifetimes; expired anchors strip their effect from
/// every target they hit that no other anchor still holds, then leave the world
pub fn expire_area_effects(world: &mut World, diff_ms: Millis) -> Vec<EntityId> {
    let mut expired = Vec::new();
    for anchor in world.area_effect_ids() {
        if let Some(effect) = world.area_effect_mut(anchor) {
            effect.remaining_ms = effect.remaining_ms.saturating_sub(diff_ms);
            if effect.remaining_ms == 0 {
                expired.push(anchor);
            }
        }
    }
    expired.sort();

    for &anchor in &expired {
        let Some(effect) = world.remove_area_effect(anchor) else {
            continue;
        };
        let mut targets: Vec<EntityId> = effect
            .affected
            .iter()
            .copied()
            .filter(|&target| !covered_elsewhere(world, &effect, target))
            .collect();
        targets.sort();
        for target in targets {
            if world
                .auras_mut()
                .remove_effect(target, effect.spell, effect.caster, effect.effect)
                .is_some()
            {
                world.emit(WorldEvent::AuraRemoved { target, caster: effect.caster, spell: effect.spell });
            }
        }
        tracing::debug!("area effect {:?} at {} expired", effect.spell, anchor);
        world.emit(WorldEvent::AreaEffectExpired { anchor, spell: effect.spell });
        world.despawn(anchor);
    }
    expired
}
