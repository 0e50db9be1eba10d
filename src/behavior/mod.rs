//! Per-creature behavior controllers
//!
//! - `state`: the controller's data, stored on the entity
//! - `controller`: the `CreatureBehavior` capability trait
//! - `base`: default hook bodies and controller actions
//! - `guard`: guard archetype
//! - `registry`: archetype → behavior lookup owned by the world
//! - `dispatch`: call a hook on an entity by handle

pub mod base;
pub mod controller;
pub mod dispatch;
pub mod guard;
pub mod registry;
pub mod state;

pub use controller::{CreatureBehavior, DefaultBehavior};
pub use guard::GuardBehavior;
pub use registry::{BehaviorRegistry, SharedBehavior};
pub use state::{AiOrder, BehaviorState, ReactState};
