//! Line-of-sight seam
//!
//! Terrain and building collision live outside this core; the world asks an
//! implementation of this trait whether two points can see each other.

use crate::core::types::Vec2;

pub trait LineOfSight: Send + Sync {
    fn is_clear(&self, from: Vec2, to: Vec2) -> bool;
}

/// Flat terrain with nothing in the way
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTerrain;

impl LineOfSight for OpenTerrain {
    fn is_clear(&self, _from: Vec2, _to: Vec2) -> bool {
        true
    }
}

/// Infinite vertical wall at `x`; anything across it is hidden
#[derive(Debug, Clone, Copy)]
pub struct WallAtX(pub f32);

impl LineOfSight for WallAtX {
    fn is_clear(&self, from: Vec2, to: Vec2) -> bool {
        (from.x < self.0) == (to.x < self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_blocks_crossing_lines_only() {
        let wall = WallAtX(10.0);
        assert!(wall.is_clear(Vec2::new(0.0, 0.0), Vec2::new(9.0, 5.0)));
        assert!(!wall.is_clear(Vec2::new(0.0, 0.0), Vec2::new(11.0, 0.0)));
        assert!(OpenTerrain.is_clear(Vec2::new(0.0, 0.0), Vec2::new(11.0, 0.0)));
    }
}
