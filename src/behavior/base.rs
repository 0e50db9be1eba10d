//! Base creature controller
//!
//! Hook bodies used by the default methods of `CreatureBehavior`, plus the
//! non-overridable actions a controller performs (flee, retreat, call for
//! help, follow). Hooks fired from inside these functions go through
//! `dispatch`, so an override of e.g. `attack_start` is honoured when a
//! call for help ends in an attack.

use crate::behavior::dispatch;
use crate::behavior::state::{AiOrder, ReactState};
use crate::combat::engage::{self, DamageKind};
use crate::combat::relations::{can_assist, can_attack, can_attack_on_sight, is_visible_for};
use crate::core::types::{EntityId, Millis, SpellId};
use crate::ecs::world::World;
use crate::entity::CategoryMask;
use crate::motion::{self, MotionOrder};
use crate::simulation::events::WorldEvent;
use crate::spatial::checks::{AnyAssistCreatureInRange, NearestAssistCreatureInRange};
use crate::spatial::visit::{collect_all, find_last, RegionQuery};
use crate::spell::info::CALL_GUARDS;

// === HOOKS ===

pub fn reset(world: &mut World, me: EntityId) {
    let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) else {
        return;
    };
    state.attack_distance = state.chase_distance;
    state.retreat_wait_ms = None;
}

pub fn is_visible(world: &World, me: EntityId, who: EntityId) -> bool {
    let (Some(me), Some(who)) = (world.get(me), world.get(who)) else {
        return false;
    };
    let Some(state) = me.behavior.as_ref() else {
        return false;
    };
    let range = state.visibility_distance;
    me.position.distance_sq(&who.position) <= range * range && is_visible_for(me, who)
}

pub fn move_in_line_of_sight(world: &mut World, me: EntityId, who: EntityId) {
    let engage = {
        let (Some(me_e), Some(who_e)) = (world.get(me), world.get(who)) else {
            return;
        };
        let Some(state) = me_e.behavior.as_ref() else {
            return;
        };
        state.has_react_state(ReactState::Aggressive)
            && me_e.combat.victim.is_none()
            && !me_e.state.in_panic()
            && can_attack_on_sight(world, me_e, who_e)
            && me_e.position.distance(&who_e.position) <= state.aggro_radius
            && world.line_of_sight().is_clear(me_e.position, who_e.position)
    };
    if engage {
        dispatch::attack_start(world, me, Some(who));
    }
}

pub fn enter_combat(world: &mut World, me: EntityId, enemy: Option<EntityId>) {
    let Some(enemy) = enemy else {
        return;
    };
    let (flee, zone_attacker) = {
        let (Some(me_e), Some(enemy_e)) = (world.get(me), world.get(enemy)) else {
            return;
        };
        let flee = me_e.settings.flee_on_melee
            && !me_e.state.rooted
            && !me_e.state.in_panic()
            && enemy_e.player_controlled;
        let zone_attacker = if me_e.is_guard() || me_e.is_civilian() {
            enemy_e.beneficiary()
        } else {
            None
        };
        (flee, zone_attacker)
    };

    if flee {
        let duration = world.config().flee_duration_ms;
        do_flee(world, me, duration);
        set_order(world, me, AiOrder::CritterFlee);
    }
    if let Some(attacker) = zone_attacker {
        world.emit(WorldEvent::ZoneUnderAttack { defender: me, attacker });
    }
}

pub fn attack_start(world: &mut World, me: EntityId, who: Option<EntityId>) {
    let Some(who) = who else {
        return;
    };
    let (passive, civilian) = match world.get(me) {
        Some(e) => (
            e.behavior
                .as_ref()
                .map(|s| s.has_react_state(ReactState::Passive))
                .unwrap_or(false),
            e.is_civilian(),
        ),
        None => return,
    };
    if passive || !engage::attack(world, me, who) {
        return;
    }

    engage::engage_in_combat_with(world, me, who);
    if civilian {
        world.emit(WorldEvent::SpellCast { caster: me, target: Some(me), spell: CALL_GUARDS });
    }
    handle_movement_on_attack_start(world, me, who);

    if world.get(who).map(|e| e.is_vehicle()).unwrap_or(false) {
        attack_passengers(world, me, who);
    }
}

fn handle_movement_on_attack_start(world: &mut World, me: EntityId, victim: EntityId) {
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    let Some(state) = entity.behavior.as_ref() else {
        return;
    };
    if state.dismount_on_aggro {
        entity.mounted = false;
    }
    if state.immobilized || state.combat_script_active {
        return;
    }
    let order = MotionOrder::Chase {
        target: victim,
        distance: state.attack_distance,
        angle: state.attack_angle,
    };
    motion::issue(world, me, order);
}

/// Put every engageable passenger of `vehicle` in combat with `me`
fn attack_passengers(world: &mut World, me: EntityId, vehicle: EntityId) {
    let passengers: Vec<EntityId> = match world.get(vehicle).and_then(|e| e.vehicle.as_ref()) {
        Some(v) => v.engageable_passengers().collect(),
        None => return,
    };
    for passenger in passengers {
        engage::add_threat(world, me, passenger, 0.0);
        engage::set_in_combat_with(world, me, passenger);
        engage::set_in_combat_with(world, passenger, me);
    }
}

pub fn damage_taken(world: &mut World, me: EntityId, dealer: Option<EntityId>, damage: u32, kind: DamageKind) {
    let prevented = {
        let Some(entity) = world.get_mut(me) else {
            return;
        };
        let lethal = entity.health <= damage;
        let unkillable = entity.settings.unkillable;
        let Some(state) = entity.behavior.as_mut() else {
            return;
        };
        if unkillable && kind != DamageKind::Instakill && lethal && !state.death_prevented {
            state.death_prevented = true;
            true
        } else {
            false
        }
    };
    if prevented {
        world.emit(WorldEvent::DeathPrevented { entity: me, dealer });
        dispatch::just_prevented_death(world, me, dealer);
    }
}

pub fn just_prevented_death(_world: &mut World, me: EntityId, dealer: Option<EntityId>) {
    tracing::debug!("{} prevented death (dealer {:?})", me, dealer);
}

pub fn on_call_for_help(world: &mut World, me: EntityId, enemy: EntityId) {
    let Some(entity) = world.get(me) else {
        return;
    };
    if world.factions().flees_from_call_for_help(entity.faction) {
        let duration = world.config().call_for_help_flee_ms;
        if set_in_panic(world, me, duration, Some(enemy)) {
            set_order(world, me, AiOrder::FleeFromCallForHelp);
        }
        return;
    }
    dispatch::attack_start(world, me, Some(enemy));
}

pub fn handle_assistance_call(world: &mut World, me: EntityId, sender: EntityId, invoker: Option<EntityId>) {
    let Some(invoker) = invoker else {
        return;
    };
    let assist = {
        let (Some(me_e), Some(sender_e), Some(invoker_e)) = (world.get(me), world.get(sender), world.get(invoker))
        else {
            return;
        };
        !me_e.combat.in_combat()
            && can_assist(world, me_e, sender_e)
            && can_attack_on_sight(world, me_e, invoker_e)
            && is_visible_for(me_e, invoker_e)
    };
    if !assist {
        return;
    }
    if let Some(entity) = world.get_mut(me) {
        entity.combat.no_call_assistance = true;
    }
    dispatch::attack_start(world, me, Some(invoker));
}

pub fn retreating_arrived(world: &mut World, me: EntityId) {
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    entity.combat.no_call_assistance = false;
    call_assistance(world, me);
}

pub fn retreating_ended(world: &mut World, me: EntityId) {
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    let Some(state) = entity.behavior.as_mut() else {
        return;
    };
    // Only the retreat that is still running may end; anything else is a stale call
    if state.order != AiOrder::Retreating {
        return;
    }
    state.order = AiOrder::None;
    state.combat_script_active = false;
    state.retreat_wait_ms = None;
    tracing::debug!("{} retreat ended", me);

    if !entity.alive {
        return;
    }
    let Some(victim) = entity.combat.victim else {
        return;
    };
    let order = MotionOrder::Chase {
        target: victim,
        distance: state.attack_distance,
        angle: state.attack_angle,
    };
    motion::issue(world, me, order);
}

pub fn timed_fleeing_ended(world: &mut World, me: EntityId) {
    let Some(entity) = world.get(me) else {
        return;
    };
    let Some(order) = entity.behavior.as_ref().map(|s| s.order) else {
        return;
    };
    let alive = entity.alive;
    let faction_flees = world.factions().flees_from_call_for_help(entity.faction);

    match order {
        AiOrder::FleeFromCallForHelp if alive && faction_flees => {
            dispatch::enter_evade_mode(world, me);
        }
        AiOrder::CritterFlee if alive => {
            if let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) {
                state.combat_script_active = false;
            }
            dispatch::enter_evade_mode(world, me);
        }
        _ => {}
    }
    set_order(world, me, AiOrder::None);
}

pub fn enter_evade_mode(world: &mut World, me: EntityId) {
    engage::evade(world, me);
}

pub fn just_reached_home(world: &mut World, me: EntityId) {
    if engage::finish_evade(world, me) {
        dispatch::reset(world, me);
    }
}

// === ACTIONS ===

pub fn set_order(world: &mut World, me: EntityId, order: AiOrder) {
    if let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) {
        if state.order != order {
            tracing::trace!("{} order {:?} -> {:?}", me, state.order, order);
        }
        state.order = order;
    }
}

pub fn set_react_state(world: &mut World, me: EntityId, react_state: ReactState) {
    if let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) {
        state.react_state = react_state;
    }
}

/// Start a timed panic running away from `from`
pub fn set_in_panic(world: &mut World, me: EntityId, duration_ms: Millis, from: Option<EntityId>) -> bool {
    let Some(entity) = world.get_mut(me) else {
        return false;
    };
    if !entity.alive || entity.state.rooted || entity.state.in_transit || entity.state.in_panic() {
        return false;
    }
    entity.state.panic_ms = Some(duration_ms);
    tracing::debug!("{} panics for {}ms", me, duration_ms);
    world.emit(WorldEvent::Fled { entity: me, duration_ms });
    motion::issue(world, me, MotionOrder::TimedFlee { from, duration_ms });
    true
}

/// Timed flee from the current opponent with combat actions suspended
pub fn do_flee(world: &mut World, me: EntityId, duration_ms: Millis) -> bool {
    let from = match world.get(me) {
        Some(e) => e.combat.victim.or_else(|| e.combat.top_threat()),
        None => return false,
    };
    if !set_in_panic(world, me, duration_ms, from) {
        return false;
    }
    if let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) {
        state.combat_script_active = true;
    }
    true
}

/// Run to the nearest ally able to help against the current victim
///
/// Fails without side effects when there is no victim, retreating is
/// disabled, or no ally is in range.
pub fn do_retreat(world: &mut World, me: EntityId) -> bool {
    let radius = world.config().flee_assistance_radius;
    let delay_ms = world.config().assistance_delay_ms;
    if radius <= 0.0 {
        return false;
    }

    let (ally, destination, facing) = {
        let Some(me_e) = world.get(me) else {
            return false;
        };
        let Some(victim_e) = me_e.combat.victim.and_then(|v| world.get(v)) else {
            return false;
        };

        let mut check = NearestAssistCreatureInRange::new(world, me_e, victim_e, radius);
        let query = RegionQuery::around_entity(me_e, radius).categories(CategoryMask::CREATURES);
        let Some(ally_e) = find_last(world, &query, |e| check.matches(e)).and_then(|id| world.get(id)) else {
            return false;
        };

        let destination = ally_e
            .position
            .offset(ally_e.combat_reach, ally_e.position.angle_to(&me_e.position));
        let facing = ally_e.position.angle_to(&victim_e.position);
        (ally_e.id, destination, facing)
    };

    motion::issue(world, me, MotionOrder::Retreat { destination, facing, delay_ms });
    set_order(world, me, AiOrder::Retreating);
    if let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) {
        state.combat_script_active = true;
    }
    tracing::debug!("{} retreats towards {}", me, ally);
    world.emit(WorldEvent::RetreatStarted { entity: me, ally });
    true
}

/// Ask idle allies nearby to join the fight against the current victim
///
/// Runs once per fight: the call suppresses further calls until a retreat
/// arrival re-enables them. Returns the number of allies asked.
pub fn call_assistance(world: &mut World, me: EntityId) -> usize {
    let radius = world.config().assistance_radius;
    let (victim, helpers) = {
        let Some(me_e) = world.get(me) else {
            return 0;
        };
        if me_e.combat.no_call_assistance || me_e.player_controlled || me_e.charmed_by.is_some() {
            return 0;
        }
        let Some(victim_e) = me_e.combat.victim.and_then(|v| world.get(v)) else {
            return 0;
        };
        if radius <= 0.0 {
            (victim_e.id, Vec::new())
        } else {
            let check = AnyAssistCreatureInRange::new(world, me_e, victim_e, radius);
            let query = RegionQuery::around_entity(me_e, radius).categories(CategoryMask::CREATURES);
            (victim_e.id, collect_all(world, &query, |e| check.matches(e)))
        }
    };

    if let Some(entity) = world.get_mut(me) {
        entity.combat.no_call_assistance = true;
    }
    for &helper in &helpers {
        dispatch::handle_assistance_call(world, helper, me, Some(victim));
    }
    world.emit(WorldEvent::AssistanceCalled { entity: me, helpers: helpers.len() });
    helpers.len()
}

/// Every idle ally within `radius` that sees us gets `on_call_for_help`
pub fn do_call_for_help(world: &mut World, me: EntityId, radius: f32) -> usize {
    let (enemy, helpers) = {
        let Some(me_e) = world.get(me) else {
            return 0;
        };
        let Some(enemy_e) = me_e.combat.victim.and_then(|v| world.get(v)) else {
            return 0;
        };
        let query = RegionQuery::around_entity(me_e, radius).categories(CategoryMask::CREATURES);
        let helpers = collect_all(world, &query, |u| {
            u.id != me
                && u.alive
                && u.has_ai()
                && !u.combat.in_combat()
                && can_assist(world, u, me_e)
                && can_attack(world, u, enemy_e)
                && world.line_of_sight().is_clear(u.position, me_e.position)
        });
        (enemy_e.id, helpers)
    };

    for &helper in &helpers {
        dispatch::on_call_for_help(world, helper, enemy);
    }
    helpers.len()
}

/// Follow `followee`; players hand out a distinct slot around themselves
pub fn request_follow(world: &mut World, me: EntityId, followee: EntityId) {
    let (base_distance, spacing) = (world.config().follow_distance, world.config().follow_ring_spacing);
    let slot = match world.get_mut(followee) {
        Some(target) if target.is_player() => Some(target.follow_slots.request(me, base_distance, spacing)),
        Some(_) => None,
        None => return,
    };

    let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) else {
        return;
    };
    if let Some((angle, distance)) = slot {
        state.follow_angle = angle;
        state.follow_distance = distance;
        state.requested_follower = Some(followee);
    }
    let order = MotionOrder::Follow {
        target: followee,
        distance: state.follow_distance,
        angle: state.follow_angle,
    };
    motion::issue(world, me, order);
}

/// Give back the follow slot, if `follower` is its holder (or any holder when `None`)
pub fn relinquish_follow(world: &mut World, me: EntityId, follower: Option<EntityId>) -> bool {
    let Some(state) = world.get_mut(me).and_then(|e| e.behavior.as_mut()) else {
        return false;
    };
    let Some(holder) = state.requested_follower else {
        return false;
    };
    if follower.map(|f| f != holder).unwrap_or(false) {
        return false;
    }
    state.requested_follower = None;

    match world.get_mut(holder) {
        Some(owner) if owner.is_player() => owner.follow_slots.relinquish(me),
        _ => false,
    }
}

pub fn set_death_prevention(world: &mut World, me: EntityId, enabled: bool) {
    if let Some(entity) = world.get_mut(me) {
        entity.settings.unkillable = enabled;
    }
}

/// Play dead: drop everything, become uninteractible, optionally cast `spell`
pub fn do_fake_death(world: &mut World, me: EntityId, spell: Option<SpellId>) {
    let Some(entity) = world.get_mut(me) else {
        return;
    };
    entity.uninteractible = true;
    entity.combat.victim = None;
    entity.state.panic_ms = None;
    world.auras_mut().remove_target(me);
    motion::issue(world, me, MotionOrder::Idle);
    world.emit(WorldEvent::FakeDeath { entity: me });

    if let Some(spell) = spell {
        world.emit(WorldEvent::SpellCast { caster: me, target: None, spell });
    }
}
