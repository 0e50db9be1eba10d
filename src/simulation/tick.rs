//! Tick system - orchestrates one world update
//!
//! Movement is reported between ticks through `World::relocate`; the tick
//! is the synchronization point where those moves land in the grid and
//! every dependent system catches up.

use crate::behavior::dispatch;
use crate::core::types::{EntityId, Millis};
use crate::ecs::world::World;
use crate::simulation::events::WorldEvent;
use crate::simulation::perception::{run_visibility_pass, VisibilityReport};
use crate::spell::area_effect::{expire_area_effects, update_area_effects};

/// Counters of one tick, logged at debug level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub relocated: usize,
    pub visibility: VisibilityReport,
    pub area_targets: usize,
    pub auras_expired: usize,
    pub anchors_expired: usize,
    pub panics_ended: usize,
    pub retreats_ended: usize,
}

/// Run a single world tick of `diff_ms` milliseconds
///
/// 1. Flush pending relocations into the grid
/// 2. Run the visibility notifier over every entity that moved or spawned
/// 3. Pulse every area effect over the units in its radius
/// 4. Age auras and area effects, removing what ran out
/// 5. End timed panics (`timed_fleeing_ended`)
/// 6. End retreat waits at the ally (`retreating_ended`)
/// 7. Advance tick counter
///
/// Returns the events recorded during the tick.
pub fn run_world_tick(world: &mut World, diff_ms: Millis) -> Vec<WorldEvent> {
    let summary = step(world, diff_ms);
    tracing::debug!(
        "tick {}: {} moved, {} movers scanned, +{}/-{} visible, {} hooks, {} area targets",
        world.current_tick,
        summary.relocated,
        summary.visibility.movers,
        summary.visibility.gained,
        summary.visibility.lost,
        summary.visibility.hooks_fired,
        summary.area_targets
    );
    world.drain_events()
}

/// Same as [`run_world_tick`] but leaves the events in the world's log
pub fn step(world: &mut World, diff_ms: Millis) -> TickSummary {
    let mut summary = TickSummary {
        relocated: world.flush_relocations().len(),
        ..Default::default()
    };

    let movers = world.take_movers();
    summary.visibility = run_visibility_pass(world, &movers);

    summary.area_targets = update_area_effects(world);

    summary.auras_expired = expire_auras(world, diff_ms);
    summary.anchors_expired = expire_area_effects(world, diff_ms).len();

    summary.panics_ended = end_panics(world, diff_ms);
    summary.retreats_ended = end_retreat_waits(world, diff_ms);

    world.tick();
    summary
}

fn expire_auras(world: &mut World, diff_ms: Millis) -> usize {
    let expired = world.auras_mut().tick(diff_ms);
    let count = expired.len();
    for holder in expired {
        // The target may be picked up again by the anchor that applied it
        for anchor in world.area_effect_ids() {
            if let Some(effect) = world.area_effect_mut(anchor) {
                if effect.caster == holder.caster && effect.spell == holder.spell {
                    effect.affected.remove(&holder.target);
                }
            }
        }
        world.emit(WorldEvent::AuraRemoved {
            target: holder.target,
            caster: holder.caster,
            spell: holder.spell,
        });
    }
    count
}

/// Count a timer down; `true` once it reaches zero
fn count_down(remaining: &mut Millis, diff_ms: Millis) -> bool {
    *remaining = remaining.saturating_sub(diff_ms);
    *remaining == 0
}

fn end_panics(world: &mut World, diff_ms: Millis) -> usize {
    let mut ended: Vec<EntityId> = Vec::new();
    for id in world.ids() {
        let Some(entity) = world.get_mut(id) else {
            continue;
        };
        let Some(remaining) = entity.state.panic_ms.as_mut() else {
            continue;
        };
        if count_down(remaining, diff_ms) {
            entity.state.panic_ms = None;
            ended.push(id);
        }
    }

    for &id in &ended {
        tracing::trace!("{} panic ended", id);
        dispatch::timed_fleeing_ended(world, id);
    }
    ended.len()
}

fn end_retreat_waits(world: &mut World, diff_ms: Millis) -> usize {
    let mut ended: Vec<EntityId> = Vec::new();
    for id in world.ids() {
        let Some(state) = world.get_mut(id).and_then(|e| e.behavior.as_mut()) else {
            continue;
        };
        let Some(remaining) = state.retreat_wait_ms.as_mut() else {
            continue;
        };
        if count_down(remaining, diff_ms) {
            state.retreat_wait_ms = None;
            ended.push(id);
        }
    }

    for &id in &ended {
        dispatch::retreating_ended(world, id);
    }
    ended.len()
}
