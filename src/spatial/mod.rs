pub mod checks;
pub mod los;
pub mod sparse_hash;
pub mod visit;

pub use los::{LineOfSight, OpenTerrain};
pub use sparse_hash::{CellCoord, CellGrid};
pub use visit::{
    collect_all, collect_nearest, find_first, find_last, for_each_in_region, visit_all, Region,
    RegionQuery,
};
