//! Visibility notifier
//!
//! For every entity that moved or spawned since the last pass, scan the
//! units around it once and use that single scan for both directions:
//!
//! 1. gather (read-only, parallel above `parallel_threshold`): who the mover
//!    sees, who sees the mover, and which pairs get perception hooks
//! 2. apply: update both visibility sets and record gained/lost events
//! 3. fire `move_in_line_of_sight` on every gated side, each unordered pair
//!    at most once per pass

use ahash::AHashSet;
use rayon::prelude::*;

use crate::behavior::dispatch;
use crate::combat::relations::is_visible_for;
use crate::core::config::WorldConfig;
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::entity::{CategoryMask, Entity};
use crate::simulation::events::WorldEvent;
use crate::spatial::visit::{collect_all, RegionQuery};

/// Result of one read-only scan around a mover
#[derive(Debug, Clone)]
pub struct MoverScan {
    pub mover: EntityId,
    /// Units the mover sees now
    pub sees: Vec<EntityId>,
    /// Units that see the mover now
    pub seen_by: Vec<EntityId>,
    /// Units paired with the mover for perception hooks
    pub hook_candidates: Vec<EntityId>,
}

impl MoverScan {
    pub fn new(mover: EntityId) -> Self {
        Self {
            mover,
            sees: Vec::new(),
            seen_by: Vec::new(),
            hook_candidates: Vec::new(),
        }
    }
}

/// Counters of one notifier pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    pub movers: usize,
    pub gained: usize,
    pub lost: usize,
    pub hooks_fired: usize,
}

/// Distance at which `entity` notices others
pub fn sight_range(config: &WorldConfig, entity: &Entity) -> f32 {
    entity
        .behavior
        .as_ref()
        .map(|state| state.visibility_distance)
        .unwrap_or(config.sight_distance)
}

fn sees(config: &WorldConfig, observer: &Entity, target: &Entity) -> bool {
    if observer.id == target.id {
        return false;
    }
    let range = sight_range(config, observer);
    observer.position.distance_sq(&target.position) <= range * range && is_visible_for(observer, target)
}

/// Candidates the notifier pairs with `mover` for hooks
///
/// Dead movers, and players that are dead or riding a transport, perceive
/// nothing. Dead units and players in transit are never candidates.
fn is_hook_candidate(mover: &Entity, candidate: &Entity) -> bool {
    if candidate.id == mover.id || !candidate.alive {
        return false;
    }
    !(candidate.is_player() && candidate.state.in_transit)
}

fn mover_perceives(mover: &Entity) -> bool {
    mover.alive && !(mover.is_player() && mover.state.in_transit)
}

/// Read-only scan around `mover`
pub fn scan_mover(world: &World, mover: EntityId) -> Option<MoverScan> {
    let mover_e = world.get(mover)?;
    if !mover_e.category.is_unit() {
        return None;
    }
    let config = world.config();
    let query = RegionQuery::around_entity(mover_e, config.max_sight_distance())
        .categories(CategoryMask::PLAYERS | CategoryMask::CREATURES);
    let nearby = collect_all(world, &query, |e| e.id != mover);

    let mut scan = MoverScan::new(mover);
    let perceives = mover_perceives(mover_e);
    for id in nearby {
        let Some(other) = world.get(id) else {
            continue;
        };
        if sees(config, mover_e, other) {
            scan.sees.push(id);
        }
        if sees(config, other, mover_e) {
            scan.seen_by.push(id);
        }
        if perceives && is_hook_candidate(mover_e, other) {
            scan.hook_candidates.push(id);
        }
    }
    Some(scan)
}

fn set_visible(world: &mut World, observer: EntityId, target: EntityId, visible: bool) -> bool {
    let changed = match world.get_mut(observer) {
        Some(o) if visible => o.visible.insert(target),
        Some(o) => o.visible.remove(&target),
        None => false,
    };
    if !changed {
        return false;
    }
    if let Some(t) = world.get_mut(target) {
        if visible {
            t.seen_by.insert(observer);
        } else {
            t.seen_by.remove(&observer);
        }
    }
    world.emit(if visible {
        WorldEvent::VisibilityGained { observer, target }
    } else {
        WorldEvent::VisibilityLost { observer, target }
    });
    true
}

/// Bring both visibility sets of the mover in line with a scan
fn apply_scan(world: &mut World, scan: &MoverScan, report: &mut VisibilityReport) {
    let Some(mover) = world.get(scan.mover) else {
        return;
    };
    let sees: AHashSet<EntityId> = scan.sees.iter().copied().collect();
    let seen_by: AHashSet<EntityId> = scan.seen_by.iter().copied().collect();
    let mut lost_out: Vec<EntityId> = mover.visible.difference(&sees).copied().collect();
    let mut lost_in: Vec<EntityId> = mover.seen_by.difference(&seen_by).copied().collect();
    lost_out.sort();
    lost_in.sort();

    for &target in &scan.sees {
        if set_visible(world, scan.mover, target, true) {
            report.gained += 1;
        }
    }
    for &observer in &scan.seen_by {
        if set_visible(world, observer, scan.mover, true) {
            report.gained += 1;
        }
    }
    for target in lost_out {
        if set_visible(world, scan.mover, target, false) {
            report.lost += 1;
        }
    }
    for observer in lost_in {
        if set_visible(world, observer, scan.mover, false) {
            report.lost += 1;
        }
    }
}

/// Fire the perception hook of `perceiver` for `target` if every gate passes
///
/// Gates are evaluated at fire time: an earlier hook in the same pass may
/// have killed, stunned or sent the perceiver into evade.
fn perceive(world: &mut World, perceiver: EntityId, target: EntityId) -> bool {
    let gated = match world.get(perceiver) {
        Some(p) => p.has_ai() && p.alive && !p.state.lost_control && !p.is_in_evade_mode(),
        None => false,
    };
    if !gated || !world.contains(target) || !dispatch::is_visible(world, perceiver, target) {
        return false;
    }
    dispatch::move_in_line_of_sight(world, perceiver, target);
    true
}

/// Full notifier pass over `movers`
pub fn run_visibility_pass(world: &mut World, movers: &[EntityId]) -> VisibilityReport {
    let threshold = world.config().parallel_threshold;
    let scans: Vec<MoverScan> = if movers.len() >= threshold {
        let shared: &World = world;
        movers.par_iter().filter_map(|&m| scan_mover(shared, m)).collect()
    } else {
        movers.iter().filter_map(|&m| scan_mover(world, m)).collect()
    };

    let mut report = VisibilityReport { movers: scans.len(), ..Default::default() };
    for scan in &scans {
        apply_scan(world, scan, &mut report);
    }

    let mut paired: AHashSet<(EntityId, EntityId)> = AHashSet::new();
    for scan in &scans {
        for &other in &scan.hook_candidates {
            let key = if scan.mover < other { (scan.mover, other) } else { (other, scan.mover) };
            if !paired.insert(key) {
                continue;
            }
            // The candidate perceives the mover first, then the mover the candidate
            if perceive(world, other, scan.mover) {
                report.hooks_fired += 1;
            }
            if perceive(world, scan.mover, other) {
                report.hooks_fired += 1;
            }
        }
    }

    tracing::trace!(
        "visibility pass: {} movers, +{} -{} visible, {} hooks",
        report.movers,
        report.gained,
        report.lost,
        report.hooks_fired
    );
    report
}

/// Notifier pass for a single entity
pub fn update_visibility(world: &mut World, mover: EntityId) -> VisibilityReport {
    run_visibility_pass(world, &[mover])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::faction::Faction;
    use crate::core::types::{FactionId, PhaseMask, TemplateEntry, Vec2};
    use crate::entity::template::CreatureTemplate;

    fn setup() -> World {
        let mut world = World::new(WorldConfig::default());
        world.register_faction(Faction::new(FactionId(1)));
        world.register_template(CreatureTemplate::new(1, "Deer", FactionId(1)));
        world
    }

    #[test]
    fn test_visibility_is_recorded_both_ways() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        let b = world.spawn_creature(TemplateEntry(1), Vec2::new(10.0, 0.0)).unwrap();

        let report = update_visibility(&mut world, a);
        assert_eq!(report.gained, 2);
        assert!(world.get(a).unwrap().visible.contains(&b));
        assert!(world.get(b).unwrap().visible.contains(&a));
        assert!(world.get(a).unwrap().seen_by().contains(&b));
    }

    #[test]
    fn test_moving_away_loses_visibility() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        let b = world.spawn_creature(TemplateEntry(1), Vec2::new(10.0, 0.0)).unwrap();
        update_visibility(&mut world, a);

        world.relocate(b, Vec2::new(500.0, 0.0));
        world.flush_relocations();
        let report = update_visibility(&mut world, b);
        assert_eq!(report.lost, 2);
        assert!(world.get(a).unwrap().visible.is_empty());
        assert!(world.get(b).unwrap().visible.is_empty());

        let lost = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, WorldEvent::VisibilityLost { .. }))
            .count();
        assert_eq!(lost, 2);
    }

    #[test]
    fn test_guard_sees_further_than_plain_units() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        let b = world.spawn_creature(TemplateEntry(1), Vec2::new(60.0, 0.0)).unwrap();
        world.get_mut(b).unwrap().behavior.as_mut().unwrap().visibility_distance = 70.0;

        update_visibility(&mut world, a);
        assert!(!world.get(a).unwrap().visible.contains(&b));
        assert!(world.get(b).unwrap().visible.contains(&a));
    }

    #[test]
    fn test_other_phase_is_never_seen() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        let b = world.spawn_creature(TemplateEntry(1), Vec2::new(5.0, 0.0)).unwrap();
        world.get_mut(b).unwrap().phase = PhaseMask(0b10);

        update_visibility(&mut world, a);
        assert!(world.get(a).unwrap().visible.is_empty());
    }

    #[test]
    fn test_scan_of_lone_mover_is_empty() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        world.spawn_creature(TemplateEntry(1), Vec2::new(300.0, 0.0)).unwrap();

        let scan = scan_mover(&world, a).unwrap();
        assert_eq!(scan.mover, a);
        assert!(scan.sees.is_empty());
        assert!(scan.seen_by.is_empty());
        assert!(scan.hook_candidates.is_empty());
    }

    #[test]
    fn test_dead_mover_fires_no_hooks() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        world.spawn_creature(TemplateEntry(1), Vec2::new(5.0, 0.0)).unwrap();
        world.get_mut(a).unwrap().alive = false;

        assert_eq!(update_visibility(&mut world, a).hooks_fired, 0);
    }

    #[test]
    fn test_pair_is_hooked_once_when_both_moved() {
        let mut world = setup();
        let a = world.spawn_creature(TemplateEntry(1), Vec2::new(0.0, 0.0)).unwrap();
        let b = world.spawn_creature(TemplateEntry(1), Vec2::new(5.0, 0.0)).unwrap();

        let report = run_visibility_pass(&mut world, &[a, b]);
        assert_eq!(report.hooks_fired, 2);
    }

    #[test]
    fn test_parallel_gather_matches_sequential() {
        let mut config = WorldConfig::default();
        config.parallel_threshold = 1;
        let mut world = World::new(config);
        world.register_template(CreatureTemplate::new(1, "Deer", FactionId(1)));
        let ids: Vec<EntityId> = (0..20)
            .map(|i| world.spawn_creature(TemplateEntry(1), Vec2::new(i as f32 * 3.0, 0.0)).unwrap())
            .collect();

        let report = run_visibility_pass(&mut world, &ids);
        assert_eq!(report.movers, 20);
        // 20 deer spread over 57 units: every pair within 50 sees each other
        let pairs = ids
            .iter()
            .flat_map(|a| ids.iter().map(move |b| (a, b)))
            .filter(|(a, b)| a < b && (a.index as i32 - b.index as i32).abs() * 3 <= 50)
            .count();
        assert_eq!(report.gained, pairs * 2);
    }
}
