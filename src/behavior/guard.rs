//! Town guard behavior

use crate::behavior::controller::CreatureBehavior;
use crate::behavior::dispatch;
use crate::behavior::state::ReactState;
use crate::combat::relations::{can_attack, is_friendly, is_hostile};
use crate::core::types::EntityId;
use crate::ecs::world::World;

/// Attacks enemies on sight, and anyone it sees fighting a friend of its own
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardBehavior;

impl CreatureBehavior for GuardBehavior {
    fn name(&self) -> &'static str {
        "guard"
    }

    fn move_in_line_of_sight(&self, world: &mut World, me: EntityId, who: EntityId) {
        let engage = {
            let (Some(guard), Some(who_e)) = (world.get(me), world.get(who)) else {
                return;
            };
            let Some(state) = guard.behavior.as_ref() else {
                return;
            };
            let attacking_friend = who_e
                .combat
                .victim
                .and_then(|v| world.get(v))
                .map(|victim| is_friendly(world, guard, victim))
                .unwrap_or(false);

            !state.has_react_state(ReactState::Passive)
                && guard.combat.victim.is_none()
                && can_attack(world, guard, who_e)
                && (is_hostile(world, guard, who_e) || attacking_friend)
                && guard.position.distance(&who_e.position) <= state.aggro_radius
                && world.line_of_sight().is_clear(guard.position, who_e.position)
        };
        if engage {
            dispatch::attack_start(world, me, Some(who));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::faction::Faction;
    use crate::core::config::WorldConfig;
    use crate::core::types::{FactionId, TemplateEntry, Vec2};
    use crate::entity::template::{CreatureFlags, CreatureTemplate};

    fn setup() -> (World, EntityId) {
        let mut world = World::new(WorldConfig::default());
        world.register_faction(Faction::new(FactionId(1)).hostile_to(FactionId(3)));
        world.register_faction(Faction::new(FactionId(2)));
        world.register_faction(Faction::new(FactionId(3)));
        world.register_template(
            CreatureTemplate::new(1, "Goldshire Guard", FactionId(1))
                .with_flags(CreatureFlags { guard: true, ..Default::default() }),
        );
        world.register_template(CreatureTemplate::new(2, "Wolf", FactionId(2)));
        let guard = world.spawn_creature(TemplateEntry(1), Vec2::default()).unwrap();
        (world, guard)
    }

    #[test]
    fn test_guard_defends_friendly_victims() {
        let (mut world, guard) = setup();
        let citizen = world.spawn_player("Citizen", Vec2::new(3.0, 0.0), FactionId(1));
        let wolf = world.spawn_creature(TemplateEntry(2), Vec2::new(5.0, 0.0)).unwrap();
        world.get_mut(wolf).unwrap().combat.victim = Some(citizen);

        GuardBehavior.move_in_line_of_sight(&mut world, guard, wolf);
        assert_eq!(world.get(guard).unwrap().combat.victim, Some(wolf));
    }

    #[test]
    fn test_guard_ignores_peaceful_neutrals() {
        let (mut world, guard) = setup();
        let wolf = world.spawn_creature(TemplateEntry(2), Vec2::new(5.0, 0.0)).unwrap();

        GuardBehavior.move_in_line_of_sight(&mut world, guard, wolf);
        assert_eq!(world.get(guard).unwrap().combat.victim, None);
    }

    #[test]
    fn test_guard_attacks_hostiles_in_range_only() {
        let (mut world, guard) = setup();
        let near = world.spawn_player("Raider", Vec2::new(10.0, 0.0), FactionId(3));
        let far = world.spawn_player("Scout", Vec2::new(60.0, 0.0), FactionId(3));

        GuardBehavior.move_in_line_of_sight(&mut world, guard, far);
        assert_eq!(world.get(guard).unwrap().combat.victim, None);
        GuardBehavior.move_in_line_of_sight(&mut world, guard, near);
        assert_eq!(world.get(guard).unwrap().combat.victim, Some(near));
    }
}
