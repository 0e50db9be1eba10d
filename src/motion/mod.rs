//! Movement orders handed to the external motion subsystem
//!
//! The core never computes paths. It records the order on the entity and
//! queues a command; the motion subsystem drains the queue, moves entities
//! and reports back through `World::relocate` and the arrival callbacks.

use serde::{Deserialize, Serialize};

use crate::behavior::dispatch;
use crate::core::types::{EntityId, Millis, Vec2};
use crate::ecs::world::World;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionOrder {
    /// Stand still
    Idle,
    /// Chase a target, keeping `distance` at `angle`
    Chase { target: EntityId, distance: f32, angle: f32 },
    /// Follow a target continuously at an offset
    Follow { target: EntityId, distance: f32, angle: f32 },
    /// Run to `destination`, face `facing`, wait `delay_ms`
    Retreat { destination: Vec2, facing: f32, delay_ms: Millis },
    /// Flee away from `from` for a fixed time
    TimedFlee { from: Option<EntityId>, duration_ms: Millis },
    /// Walk back to the spawn point
    Home,
}

impl Default for MotionOrder {
    fn default() -> Self {
        Self::Idle
    }
}

/// One queued order for the motion subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub entity: EntityId,
    pub order: MotionOrder,
}

/// Replace an entity's current movement
pub fn issue(world: &mut World, entity: EntityId, order: MotionOrder) {
    let Some(e) = world.get_mut(entity) else {
        return;
    };
    tracing::trace!("motion {}: {:?}", entity, order);
    e.motion = order.clone();
    world.push_motion(MotionCommand { entity, order });
}

/// The motion subsystem reports that `entity` reached the end of its order
///
/// Retreats start the wait at the ally and fire `retreating_arrived`; a walk
/// home ends the evade. Other orders have no arrival callback.
pub fn arrived(world: &mut World, entity: EntityId) {
    let Some(e) = world.get_mut(entity) else {
        return;
    };
    match e.motion {
        MotionOrder::Retreat { delay_ms, .. } => {
            e.motion = MotionOrder::Idle;
            if let Some(state) = e.behavior.as_mut() {
                state.retreat_wait_ms = Some(delay_ms);
            }
            dispatch::retreating_arrived(world, entity);
        }
        MotionOrder::Home => {
            e.motion = MotionOrder::Idle;
            dispatch::just_reached_home(world, entity);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::WorldConfig;
    use crate::core::types::FactionId;

    #[test]
    fn test_issue_records_and_queues() {
        let mut world = World::new(WorldConfig::default());
        let id = world.spawn_player("Mara", Vec2::default(), FactionId(1));
        issue(&mut world, id, MotionOrder::Home);

        assert_eq!(world.get(id).unwrap().motion, MotionOrder::Home);
        let queued = world.drain_motion();
        assert_eq!(queued, vec![MotionCommand { entity: id, order: MotionOrder::Home }]);
        assert!(world.drain_motion().is_empty());
    }

    #[test]
    fn test_arriving_home_ends_evade() {
        let mut world = World::new(WorldConfig::default());
        world.register_template(crate::entity::CreatureTemplate::new(1, "Boar", FactionId(1)));
        let boar = world.spawn_creature(crate::core::types::TemplateEntry(1), Vec2::default()).unwrap();
        crate::combat::engage::evade(&mut world, boar);
        assert!(world.get(boar).unwrap().is_in_evade_mode());

        arrived(&mut world, boar);
        let boar_entity = world.get(boar).unwrap();
        assert!(!boar_entity.is_in_evade_mode());
        assert_eq!(boar_entity.motion, MotionOrder::Idle);
    }

    #[test]
    fn test_issue_for_missing_entity_is_ignored() {
        let mut world = World::new(WorldConfig::default());
        let id = world.spawn_player("Mara", Vec2::default(), FactionId(1));
        world.despawn(id);
        issue(&mut world, id, MotionOrder::Home);
        assert!(world.drain_motion().is_empty());
    }
}
