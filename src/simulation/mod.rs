pub mod events;
pub mod perception;
pub mod tick;

pub use events::WorldEvent;
pub use perception::{run_visibility_pass, update_visibility, VisibilityReport};
pub use tick::{run_world_tick, step, TickSummary};
