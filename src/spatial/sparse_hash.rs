//! Sparse hash grid of spatial cells with per-category membership

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec2};
use crate::entity::EntityCategory;

/// Integer coordinate of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One partition: an unordered membership list per category
///
/// Cells index entities; they never own them.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    members: [Vec<EntityId>; EntityCategory::COUNT],
}

impl Cell {
    pub fn members(&self, category: EntityCategory) -> &[EntityId] {
        &self.members[category.index()]
    }

    fn is_empty(&self) -> bool {
        self.members.iter().all(Vec::is_empty)
    }
}

/// Sparse hash grid; cells are created on first insert and dropped when empty
pub struct CellGrid {
    cell_size: f32,
    cells: AHashMap<CellCoord, Cell>,
}

impl CellGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn cell_coord(&self, pos: Vec2) -> CellCoord {
        CellCoord::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, entity: EntityId, category: EntityCategory, pos: Vec2) -> CellCoord {
        let coord = self.cell_coord(pos);
        let members = &mut self.cells.entry(coord).or_default().members[category.index()];
        if !members.contains(&entity) {
            members.push(entity);
        }
        coord
    }

    pub fn remove(&mut self, entity: EntityId, category: EntityCategory, coord: CellCoord) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            let members = &mut cell.members[category.index()];
            if let Some(i) = members.iter().position(|&e| e == entity) {
                members.swap_remove(i);
            }
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Move membership from one cell to another in a single step
    pub fn relocate(
        &mut self,
        entity: EntityId,
        category: EntityCategory,
        from: CellCoord,
        to_pos: Vec2,
    ) -> CellCoord {
        let to = self.cell_coord(to_pos);
        if to != from {
            self.remove(entity, category, from);
            self.insert(entity, category, to_pos);
        }
        to
    }

    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    pub fn members(&self, coord: CellCoord, category: EntityCategory) -> &[EntityId] {
        self.cells
            .get(&coord)
            .map(|cell| cell.members(category))
            .unwrap_or(&[])
    }

    /// Every cell overlapping the square that bounds a circle
    pub fn cells_in_radius(&self, center: Vec2, radius: f32) -> impl Iterator<Item = CellCoord> {
        let min = self.cell_coord(Vec2::new(center.x - radius, center.y - radius));
        let max = self.cell_coord(Vec2::new(center.x + radius, center.y + radius));

        (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| CellCoord::new(x, y)))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of cells listing `entity` under `category` (0 or 1 when consistent)
    pub fn membership_count(&self, entity: EntityId, category: EntityCategory) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.members(category).contains(&entity))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_positions_use_floor() {
        let grid = CellGrid::new(10.0);
        assert_eq!(grid.cell_coord(Vec2::new(-0.5, 5.0)), CellCoord::new(-1, 0));
        assert_eq!(grid.cell_coord(Vec2::new(19.9, -10.0)), CellCoord::new(1, -1));
    }

    #[test]
    fn test_relocate_moves_membership() {
        let mut grid = CellGrid::new(10.0);
        let id = EntityId::new(1, 0);
        let from = grid.insert(id, EntityCategory::Creature, Vec2::new(1.0, 1.0));
        let to = grid.relocate(id, EntityCategory::Creature, from, Vec2::new(25.0, 1.0));

        assert_ne!(from, to);
        assert!(grid.members(from, EntityCategory::Creature).is_empty());
        assert_eq!(grid.members(to, EntityCategory::Creature), &[id]);
        assert_eq!(grid.membership_count(id, EntityCategory::Creature), 1);
    }

    #[test]
    fn test_empty_cells_are_dropped() {
        let mut grid = CellGrid::new(10.0);
        let id = EntityId::new(1, 0);
        let coord = grid.insert(id, EntityCategory::Player, Vec2::new(1.0, 1.0));
        assert_eq!(grid.cell_count(), 1);
        grid.remove(id, EntityCategory::Player, coord);
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn test_categories_are_separate() {
        let mut grid = CellGrid::new(10.0);
        let id = EntityId::new(1, 0);
        let coord = grid.insert(id, EntityCategory::Player, Vec2::new(1.0, 1.0));
        assert!(grid.members(coord, EntityCategory::Creature).is_empty());
        assert_eq!(grid.members(coord, EntityCategory::Player).len(), 1);
    }

    #[test]
    fn test_cells_in_radius_covers_bounding_square() {
        let grid = CellGrid::new(10.0);
        let cells: Vec<_> = grid.cells_in_radius(Vec2::new(5.0, 5.0), 6.0).collect();
        // -1..=1 on both axes
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&CellCoord::new(-1, -1)));
        assert!(cells.contains(&CellCoord::new(1, 1)));
    }
}
