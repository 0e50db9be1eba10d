//! Capability interface of a creature's behavior controller
//!
//! Every hook has a default implementation that runs the base controller in
//! [`crate::behavior::base`]. Specialised behaviors override the hooks they
//! care about and may call the base function from inside the override.
//!
//! Implementations are stateless and shared between all creatures of an
//! archetype: the per-creature state lives in `Entity::behavior` and is
//! reached through the world with the creature's handle.

use crate::behavior::base;
use crate::combat::engage::DamageKind;
use crate::core::types::EntityId;
use crate::ecs::world::World;

pub trait CreatureBehavior: Send + Sync {
    fn name(&self) -> &'static str;

    /// Back to the out-of-combat baseline (after evading home)
    fn reset(&self, world: &mut World, me: EntityId) {
        base::reset(world, me)
    }

    /// Whether `who` is in sight for this controller's perception hook
    fn is_visible(&self, world: &World, me: EntityId, who: EntityId) -> bool {
        base::is_visible(world, me, who)
    }

    /// Perception hook: `who` came into sight
    fn move_in_line_of_sight(&self, world: &mut World, me: EntityId, who: EntityId) {
        base::move_in_line_of_sight(world, me, who)
    }

    fn enter_combat(&self, world: &mut World, me: EntityId, enemy: Option<EntityId>) {
        base::enter_combat(world, me, enemy)
    }

    fn attack_start(&self, world: &mut World, me: EntityId, who: Option<EntityId>) {
        base::attack_start(world, me, who)
    }

    /// Runs before `damage` is applied
    fn damage_taken(
        &self,
        world: &mut World,
        me: EntityId,
        dealer: Option<EntityId>,
        damage: u32,
        kind: DamageKind,
    ) {
        base::damage_taken(world, me, dealer, damage, kind)
    }

    fn just_prevented_death(&self, world: &mut World, me: EntityId, dealer: Option<EntityId>) {
        base::just_prevented_death(world, me, dealer)
    }

    fn on_call_for_help(&self, world: &mut World, me: EntityId, enemy: EntityId) {
        base::on_call_for_help(world, me, enemy)
    }

    /// `sender` retreated to us and asks for help against `invoker`
    fn handle_assistance_call(
        &self,
        world: &mut World,
        me: EntityId,
        sender: EntityId,
        invoker: Option<EntityId>,
    ) {
        base::handle_assistance_call(world, me, sender, invoker)
    }

    fn retreating_arrived(&self, world: &mut World, me: EntityId) {
        base::retreating_arrived(world, me)
    }

    fn retreating_ended(&self, world: &mut World, me: EntityId) {
        base::retreating_ended(world, me)
    }

    fn timed_fleeing_ended(&self, world: &mut World, me: EntityId) {
        base::timed_fleeing_ended(world, me)
    }

    fn enter_evade_mode(&self, world: &mut World, me: EntityId) {
        base::enter_evade_mode(world, me)
    }

    fn just_reached_home(&self, world: &mut World, me: EntityId) {
        base::just_reached_home(world, me)
    }
}

/// Plain creature controller
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl CreatureBehavior for DefaultBehavior {
    fn name(&self) -> &'static str {
        "default"
    }
}
