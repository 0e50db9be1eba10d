//! Hook dispatch by entity handle
//!
//! Looks up the behavior registered for the entity's archetype and forwards
//! the call. Entities without a controller (players, objects, dead handles)
//! silently ignore every hook.

use crate::behavior::registry::SharedBehavior;
use crate::combat::engage::DamageKind;
use crate::core::types::EntityId;
use crate::ecs::world::World;

fn controller(world: &World, me: EntityId) -> Option<SharedBehavior> {
    let entity = world.get(me)?;
    entity.behavior.as_ref()?;
    Some(world.behaviors().get(entity.archetype))
}

pub fn reset(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.reset(world, me);
    }
}

pub fn is_visible(world: &World, me: EntityId, who: EntityId) -> bool {
    controller(world, me)
        .map(|behavior| behavior.is_visible(world, me, who))
        .unwrap_or(false)
}

pub fn move_in_line_of_sight(world: &mut World, me: EntityId, who: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.move_in_line_of_sight(world, me, who);
    }
}

pub fn enter_combat(world: &mut World, me: EntityId, enemy: Option<EntityId>) {
    if let Some(behavior) = controller(world, me) {
        behavior.enter_combat(world, me, enemy);
    }
}

pub fn attack_start(world: &mut World, me: EntityId, who: Option<EntityId>) {
    if let Some(behavior) = controller(world, me) {
        behavior.attack_start(world, me, who);
    }
}

pub fn damage_taken(world: &mut World, me: EntityId, dealer: Option<EntityId>, damage: u32, kind: DamageKind) {
    if let Some(behavior) = controller(world, me) {
        behavior.damage_taken(world, me, dealer, damage, kind);
    }
}

pub fn just_prevented_death(world: &mut World, me: EntityId, dealer: Option<EntityId>) {
    if let Some(behavior) = controller(world, me) {
        behavior.just_prevented_death(world, me, dealer);
    }
}

pub fn on_call_for_help(world: &mut World, me: EntityId, enemy: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.on_call_for_help(world, me, enemy);
    }
}

pub fn handle_assistance_call(world: &mut World, me: EntityId, sender: EntityId, invoker: Option<EntityId>) {
    if let Some(behavior) = controller(world, me) {
        behavior.handle_assistance_call(world, me, sender, invoker);
    }
}

pub fn retreating_arrived(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.retreating_arrived(world, me);
    }
}

pub fn retreating_ended(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.retreating_ended(world, me);
    }
}

pub fn timed_fleeing_ended(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.timed_fleeing_ended(world, me);
    }
}

pub fn enter_evade_mode(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.enter_evade_mode(world, me);
    }
}

pub fn just_reached_home(world: &mut World, me: EntityId) {
    if let Some(behavior) = controller(world, me) {
        behavior.just_reached_home(world, me);
    }
}
