//! Reusable decision functions for region traversals

use crate::combat::relations::{can_assist, can_attack_on_sight};
use crate::ecs::world::World;
use crate::entity::Entity;

/// Idle creature that could help `me` against `enemy`
fn is_idle_helper(world: &World, me: &Entity, enemy: &Entity, candidate: &Entity) -> bool {
    candidate.id != me.id
        && candidate.is_creature()
        && candidate.alive
        && !candidate.combat.in_combat()
        && !candidate.is_in_evade_mode()
        && !candidate.state.lost_control
        && can_assist(world, candidate, me)
        && can_attack_on_sight(world, candidate, enemy)
}

/// Nearest idle ally of `me` able to attack `enemy`
///
/// The range shrinks to each accepted candidate's distance, so under a
/// last-match traversal the surviving result is the closest one.
pub struct NearestAssistCreatureInRange<'a> {
    world: &'a World,
    me: &'a Entity,
    enemy: &'a Entity,
    range: f32,
}

impl<'a> NearestAssistCreatureInRange<'a> {
    pub fn new(world: &'a World, me: &'a Entity, enemy: &'a Entity, range: f32) -> Self {
        Self { world, me, enemy, range }
    }

    pub fn matches(&mut self, candidate: &Entity) -> bool {
        if !is_idle_helper(self.world, self.me, self.enemy, candidate) {
            return false;
        }
        let distance = self.me.position.distance(&candidate.position);
        if distance > self.range {
            return false;
        }
        self.range = distance;
        true
    }
}

/// Any idle ally of `me` able to attack `enemy` within a fixed range
pub struct AnyAssistCreatureInRange<'a> {
    world: &'a World,
    me: &'a Entity,
    enemy: &'a Entity,
    range: f32,
}

impl<'a> AnyAssistCreatureInRange<'a> {
    pub fn new(world: &'a World, me: &'a Entity, enemy: &'a Entity, range: f32) -> Self {
        Self { world, me, enemy, range }
    }

    pub fn matches(&self, candidate: &Entity) -> bool {
        is_idle_helper(self.world, self.me, self.enemy, candidate)
            && self.me.position.distance(&candidate.position) <= self.range
    }
}
