//! Combat entry, exit and damage
//!
//! These are the core unit actions the behavior controller is layered on.
//! Hooks are fired through `behavior::dispatch` so overrides take effect.

use crate::behavior::dispatch;
use crate::combat::relations::can_attack;
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::motion::{self, MotionOrder};
use crate::simulation::events::WorldEvent;

/// How damage interacts with death prevention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    Normal,
    /// Ignores the unkillable flag
    Instakill,
}

/// Make `who` the current victim of `me`
///
/// Fails for invalid targets and when `who` already is the victim.
pub fn attack(world: &mut World, me: EntityId, who: EntityId) -> bool {
    let allowed = match (world.get(me), world.get(who)) {
        (Some(attacker), Some(target)) => attacker.alive && can_attack(world, attacker, target),
        _ => false,
    };
    if !allowed {
        return false;
    }

    let Some(attacker) = world.get_mut(me) else {
        return false;
    };
    if attacker.combat.victim == Some(who) {
        return false;
    }
    attacker.combat.victim = Some(who);
    tracing::debug!("{} attacks {}", me, who);
    true
}

pub fn add_threat(world: &mut World, me: EntityId, target: EntityId, amount: f32) {
    if !world.contains(target) {
        return;
    }
    if let Some(entity) = world.get_mut(me) {
        entity.combat.add_threat(target, amount);
    }
}

/// Flag `me` in combat with `enemy`; returns true when `me` just entered combat
pub fn set_in_combat_with(world: &mut World, me: EntityId, enemy: EntityId) -> bool {
    if me == enemy || !world.contains(enemy) {
        return false;
    }
    let Some(entity) = world.get_mut(me) else {
        return false;
    };
    if !entity.alive {
        return false;
    }
    let entered = !entity.combat.in_combat();
    entity.combat.in_combat_with.insert(enemy);

    if entered {
        world.emit(WorldEvent::EnteredCombat { entity: me, enemy: Some(enemy) });
        dispatch::enter_combat(world, me, Some(enemy));
    }
    entered
}

/// Threat plus mutual combat flags
pub fn engage_in_combat_with(world: &mut World, me: EntityId, enemy: EntityId) {
    add_threat(world, me, enemy, 0.0);
    set_in_combat_with(world, me, enemy);
    set_in_combat_with(world, enemy, me);
}

/// Leave combat on both sides of every fight `me` is part of
pub fn clear_combat(world: &mut World, me: EntityId) {
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    let mut opponents: Vec<EntityId> = entity
        .combat
        .in_combat_with
        .iter()
        .chain(entity.combat.threat.keys())
        .copied()
        .collect();
    entity.combat.clear();

    opponents.sort();
    opponents.dedup();
    for other in opponents {
        if let Some(opponent) = world.get_mut(other) {
            opponent.combat.forget(me);
        }
    }
}

/// Drop out of combat and walk home, ignoring the world meanwhile
pub fn evade(world: &mut World, me: EntityId) {
    clear_combat(world, me);
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    if !entity.alive {
        return;
    }
    entity.combat.evading = true;
    tracing::debug!("{} evades", me);
    world.emit(WorldEvent::EvadeStarted { entity: me });
    motion::issue(world, me, MotionOrder::Home);
}

/// Evade ended at the home position
pub fn finish_evade(world: &mut World, me: EntityId) -> bool {
    let Some(entity) = world.get_mut(me) else {
        return false;
    };
    if !entity.combat.evading {
        return false;
    }
    entity.combat.evading = false;
    world.emit(WorldEvent::EvadeFinished { entity: me });
    true
}

/// Kill `victim` outright
pub fn kill(world: &mut World, killer: Option<EntityId>, victim: EntityId) {
    let Some(entity) = world.get_mut(victim) else {
        return;
    };
    if !entity.alive {
        return;
    }
    entity.alive = false;
    entity.health = 0;
    entity.state.panic_ms = None;
    clear_combat(world, victim);
    motion::issue(world, victim, MotionOrder::Idle);
    tracing::debug!("{} died", victim);
    world.emit(WorldEvent::Died { entity: victim, killer });
}

/// Apply `damage` to `victim`; returns the damage actually dealt
///
/// Lethal hits on unkillable units are clamped to leave one health point,
/// unless the damage is an instakill.
pub fn deal_damage(
    world: &mut World,
    dealer: Option<EntityId>,
    victim: EntityId,
    damage: u32,
    kind: DamageKind,
) -> u32 {
    match world.get(victim) {
        Some(entity) if entity.alive => {}
        _ => return 0,
    }

    dispatch::damage_taken(world, victim, dealer, damage, kind);

    let Some(entity) = world.get_mut(victim) else {
        return 0;
    };
    if !entity.alive {
        return 0;
    }

    let mut dealt = damage;
    if dealt >= entity.health {
        if entity.settings.unkillable && kind != DamageKind::Instakill {
            dealt = entity.health.saturating_sub(1);
        } else {
            dealt = entity.health;
            kill(world, dealer, victim);
            return dealt;
        }
    }
    entity.health -= dealt;

    let Some(dealer) = dealer.filter(|&d| d != victim && world.contains(d)) else {
        return dealt;
    };
    engage_in_combat_with(world, victim, dealer);
    add_threat(world, victim, dealer, dealt as f32);

    let fights_back = world
        .get(victim)
        .map(|e| e.alive && e.has_ai() && e.combat.victim.is_none())
        .unwrap_or(false);
    if fights_back {
        dispatch::attack_start(world, victim, Some(dealer));
    }
    dealt
}
