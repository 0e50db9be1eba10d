//! Region traversal over the cell grid
//!
//! One primitive, [`for_each_in_region`], walks every live entity of the
//! requested categories inside a region and lets the callback stop early
//! through `ControlFlow`. The four traversal shapes the rest of the core
//! needs are thin wrappers around it:
//!
//! - [`find_first`]: first positive match, stops scanning
//! - [`find_last`]: keeps scanning, last positive match wins
//! - [`collect_all`]: every positive match, in scan order
//! - [`visit_all`]: side-effecting action with `&mut World` on every entity
//!
//! All shapes hide entities whose phase mask does not overlap the query's.

use std::ops::ControlFlow;

use ordered_float::OrderedFloat;

use crate::core::types::{EntityId, PhaseMask, Vec2};
use crate::ecs::world::World;
use crate::entity::{CategoryMask, Entity, EntityCategory};
use crate::spatial::sparse_hash::CellCoord;

/// Area covered by a traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    /// Every member of a single cell
    Cell(CellCoord),
    /// Every member within `radius` of `center`
    Radius { center: Vec2, radius: f32 },
}

/// Region plus the category and phase filters applied during the scan
#[derive(Debug, Clone, Copy)]
pub struct RegionQuery {
    pub region: Region,
    pub categories: CategoryMask,
    pub phase: PhaseMask,
}

impl RegionQuery {
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            region: Region::Radius { center, radius },
            categories: CategoryMask::ALL,
            phase: PhaseMask::ALL,
        }
    }

    /// Radius query anchored on an entity, scoped to its phase
    pub fn around_entity(entity: &Entity, radius: f32) -> Self {
        Self::around(entity.position, radius).phase(entity.phase)
    }

    pub fn cell(coord: CellCoord) -> Self {
        Self {
            region: Region::Cell(coord),
            categories: CategoryMask::ALL,
            phase: PhaseMask::ALL,
        }
    }

    pub fn categories(mut self, categories: CategoryMask) -> Self {
        self.categories = categories;
        self
    }

    pub fn phase(mut self, phase: PhaseMask) -> Self {
        self.phase = phase;
        self
    }

    #[inline]
    fn contains(&self, pos: Vec2) -> bool {
        match self.region {
            Region::Cell(_) => true,
            Region::Radius { center, radius } => center.distance_sq(&pos) <= radius * radius,
        }
    }
}

/// Walk every matching entity; stops as soon as `f` breaks
pub fn for_each_in_region<B, F>(world: &World, query: &RegionQuery, mut f: F) -> ControlFlow<B>
where
    F: FnMut(&Entity) -> ControlFlow<B>,
{
    let grid = world.grid();
    let cells: Vec<CellCoord> = match query.region {
        Region::Cell(coord) => vec![coord],
        Region::Radius { center, radius } => grid.cells_in_radius(center, radius).collect(),
    };

    for coord in cells {
        let Some(cell) = grid.cell(coord) else {
            continue;
        };

        for category in EntityCategory::ALL {
            if !query.categories.contains(category) {
                continue;
            }

            for &id in cell.members(category) {
                // Stale index entries (despawned handles) resolve to nothing
                let Some(entity) = world.get(id) else {
                    continue;
                };
                if !entity.phase.overlaps(query.phase) || !query.contains(entity.position) {
                    continue;
                }
                if let ControlFlow::Break(b) = f(entity) {
                    return ControlFlow::Break(b);
                }
            }
        }
    }

    ControlFlow::Continue(())
}

/// First entity accepted by `check`
pub fn find_first<F>(world: &World, query: &RegionQuery, mut check: F) -> Option<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    match for_each_in_region(world, query, |entity| {
        if check(entity) {
            ControlFlow::Break(entity.id)
        } else {
            ControlFlow::Continue(())
        }
    }) {
        ControlFlow::Break(id) => Some(id),
        ControlFlow::Continue(()) => None,
    }
}

/// Last entity accepted by `check`
///
/// Paired with a check that narrows its own range on every hit this yields
/// the nearest match.
pub fn find_last<F>(world: &World, query: &RegionQuery, mut check: F) -> Option<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    let mut found = None;
    let _ = for_each_in_region::<(), _>(world, query, |entity| {
        if check(entity) {
            found = Some(entity.id);
        }
        ControlFlow::Continue(())
    });
    found
}

/// Every entity accepted by `check`, in scan order
pub fn collect_all<F>(world: &World, query: &RegionQuery, mut check: F) -> Vec<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    let mut found = Vec::new();
    let _ = for_each_in_region::<(), _>(world, query, |entity| {
        if check(entity) {
            found.push(entity.id);
        }
        ControlFlow::Continue(())
    });
    found
}

/// Every entity accepted by `check`, nearest to `origin` first
pub fn collect_nearest<F>(world: &World, query: &RegionQuery, origin: Vec2, mut check: F) -> Vec<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    let mut found: Vec<(OrderedFloat<f32>, EntityId)> = Vec::new();
    let _ = for_each_in_region::<(), _>(world, query, |entity| {
        if check(entity) {
            found.push((OrderedFloat(origin.distance_sq(&entity.position)), entity.id));
        }
        ControlFlow::Continue(())
    });
    found.sort();
    found.into_iter().map(|(_, id)| id).collect()
}

/// Apply `action` to every entity in the region
///
/// Membership is snapshotted first, then each entity is re-resolved right
/// before its turn: anything despawned or killed by an earlier action is
/// skipped. Returns the number of entities visited.
pub fn visit_all<F>(world: &mut World, query: &RegionQuery, mut action: F) -> usize
where
    F: FnMut(&mut World, EntityId),
{
    let mut snapshot: Vec<(EntityId, bool)> = Vec::new();
    let _ = for_each_in_region::<(), _>(world, query, |entity| {
        snapshot.push((entity.id, entity.alive));
        ControlFlow::Continue(())
    });

    let mut visited = 0;
    for (id, was_alive) in snapshot {
        let still_eligible = match world.get(id) {
            Some(entity) => (!was_alive || entity.alive) && entity.phase.overlaps(query.phase),
            None => false,
        };
        if !still_eligible {
            continue;
        }
        action(world, id);
        visited += 1;
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::WorldConfig;
    use crate::core::types::FactionId;
    use crate::entity::template::CreatureTemplate;

    fn world_with_creatures(positions: &[(f32, f32)]) -> (World, Vec<EntityId>) {
        let mut world = World::new(WorldConfig::default());
        world.register_template(CreatureTemplate::new(1, "Boar", FactionId(1)));
        let ids = positions
            .iter()
            .map(|&(x, y)| world.spawn_creature(crate::core::types::TemplateEntry(1), Vec2::new(x, y)).unwrap())
            .collect();
        (world, ids)
    }

    #[test]
    fn test_find_first_stops_at_first_match() {
        let (world, ids) = world_with_creatures(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut checked = 0;
        let found = find_first(&world, &RegionQuery::around(Vec2::default(), 10.0), |_| {
            checked += 1;
            true
        });
        assert!(found.is_some());
        assert!(ids.contains(&found.unwrap()));
        assert_eq!(checked, 1);
    }

    #[test]
    fn test_find_last_scans_everything() {
        let (world, _) = world_with_creatures(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut checked = 0;
        let found = find_last(&world, &RegionQuery::around(Vec2::default(), 10.0), |_| {
            checked += 1;
            true
        });
        assert!(found.is_some());
        assert_eq!(checked, 3);
    }

    #[test]
    fn test_radius_excludes_far_entities() {
        let (world, ids) = world_with_creatures(&[(0.0, 0.0), (100.0, 0.0)]);
        let found = collect_all(&world, &RegionQuery::around(Vec2::default(), 10.0), |_| true);
        assert_eq!(found, vec![ids[0]]);
    }

    #[test]
    fn test_phase_filter_hides_entities() {
        let (mut world, ids) = world_with_creatures(&[(0.0, 0.0), (1.0, 0.0)]);
        world.get_mut(ids[1]).unwrap().phase = PhaseMask(0b10);

        let query = RegionQuery::around(Vec2::default(), 10.0).phase(PhaseMask(0b01));
        // Even a predicate accepting everything never sees the other phase
        let found = collect_all(&world, &query, |_| true);
        assert_eq!(found, vec![ids[0]]);
    }

    #[test]
    fn test_category_filter() {
        let (mut world, _) = world_with_creatures(&[(0.0, 0.0)]);
        let player = world.spawn_player("Aldric", Vec2::new(1.0, 1.0), FactionId(1));

        let query = RegionQuery::around(Vec2::default(), 10.0).categories(CategoryMask::PLAYERS);
        assert_eq!(collect_all(&world, &query, |_| true), vec![player]);
    }

    #[test]
    fn test_collect_nearest_orders_by_distance() {
        let (world, ids) = world_with_creatures(&[(5.0, 0.0), (1.0, 0.0), (3.0, 0.0)]);
        let found = collect_nearest(&world, &RegionQuery::around(Vec2::default(), 10.0), Vec2::default(), |_| true);
        assert_eq!(found, vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_visit_all_skips_entities_killed_mid_traversal() {
        let (mut world, ids) = world_with_creatures(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut visited = Vec::new();
        let count = visit_all(&mut world, &RegionQuery::around(Vec2::default(), 10.0), |world, id| {
            visited.push(id);
            // The first visitor kills everybody else
            for &other in &ids {
                if other != id {
                    if let Some(entity) = world.get_mut(other) {
                        entity.alive = false;
                    }
                }
            }
        });
        assert_eq!(count, 1);
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_visit_all_skips_entities_despawned_mid_traversal() {
        let (mut world, ids) = world_with_creatures(&[(0.0, 0.0), (1.0, 0.0)]);
        let count = visit_all(&mut world, &RegionQuery::around(Vec2::default(), 10.0), |world, id| {
            for &other in &ids {
                if other != id {
                    world.despawn(other);
                }
            }
        });
        assert_eq!(count, 1);
    }
}
