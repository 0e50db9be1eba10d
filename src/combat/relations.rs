//! Who may see, attack or assist whom

use crate::combat::faction::Reaction;
use crate::ecs::world::World;
use crate::entity::Entity;

pub fn is_hostile(world: &World, a: &Entity, b: &Entity) -> bool {
    world.factions().reaction(a.faction, b.faction) == Reaction::Hostile
}

pub fn is_friendly(world: &World, a: &Entity, b: &Entity) -> bool {
    world.factions().reaction(a.faction, b.faction) == Reaction::Friendly
}

/// Can `viewer` see `target` at all, ignoring distance
pub fn is_visible_for(viewer: &Entity, target: &Entity) -> bool {
    if viewer.id == target.id {
        return true;
    }
    viewer.phase.overlaps(target.phase) && !target.is_hidden_player()
}

/// Valid attack target for `attacker`, regardless of whether it wants to
pub fn can_attack(world: &World, attacker: &Entity, target: &Entity) -> bool {
    attacker.id != target.id
        && target.alive
        && target.category.is_unit()
        && !target.uninteractible
        && !target.state.in_transit
        && !target.is_in_evade_mode()
        && is_visible_for(attacker, target)
        && !is_friendly(world, attacker, target)
}

/// Target `attacker` would start a fight with on sight
pub fn can_attack_on_sight(world: &World, attacker: &Entity, target: &Entity) -> bool {
    can_attack(world, attacker, target) && is_hostile(world, attacker, target)
}

/// Can `helper` support `target` (heal, buff, join its fight)
pub fn can_assist(world: &World, helper: &Entity, target: &Entity) -> bool {
    target.alive
        && helper.phase.overlaps(target.phase)
        && is_friendly(world, helper, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::faction::Faction;
    use crate::core::config::WorldConfig;
    use crate::core::types::{FactionId, PhaseMask, Vec2};
    use crate::entity::EntityCategory;

    fn world() -> World {
        let mut world = World::new(WorldConfig::default());
        world.register_faction(Faction::new(FactionId(1)).hostile_to(FactionId(2)));
        world.register_faction(Faction::new(FactionId(2)));
        world
    }

    fn unit(faction: u32) -> Entity {
        let mut e = Entity::new(EntityCategory::Creature, Vec2::default());
        e.faction = FactionId(faction);
        e.id = crate::core::types::EntityId::new(faction, 0);
        e
    }

    #[test]
    fn test_hostile_units_attack_on_sight() {
        let world = world();
        let a = unit(1);
        let b = unit(2);
        assert!(can_attack_on_sight(&world, &a, &b));
        assert!(!can_assist(&world, &a, &b));
    }

    #[test]
    fn test_neutral_units_can_be_attacked_but_not_on_sight() {
        let world = world();
        let a = unit(1);
        let c = unit(3);
        assert!(can_attack(&world, &a, &c));
        assert!(!can_attack_on_sight(&world, &a, &c));
    }

    #[test]
    fn test_evading_and_dead_targets_are_not_attackable() {
        let world = world();
        let a = unit(1);
        let mut b = unit(2);
        b.combat.evading = true;
        assert!(!can_attack(&world, &a, &b));

        b.combat.evading = false;
        b.alive = false;
        assert!(!can_attack(&world, &a, &b));
    }

    #[test]
    fn test_hidden_player_is_invisible() {
        let a = unit(1);
        let mut gm = Entity::new(EntityCategory::Player, Vec2::default());
        gm.id = crate::core::types::EntityId::new(50, 0);
        gm.game_master = true;
        assert!(!is_visible_for(&a, &gm));
        assert!(is_visible_for(&gm, &gm));
    }

    #[test]
    fn test_other_phase_is_invisible() {
        let a = unit(1);
        let mut b = unit(2);
        b.phase = PhaseMask(0b100);
        assert!(!is_visible_for(&a, &b));
    }
}
