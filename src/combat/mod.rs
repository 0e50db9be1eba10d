//! Combat relations, threat and engagement

pub mod engage;
pub mod faction;
pub mod relations;
pub mod state;

pub use engage::{deal_damage, engage_in_combat_with, DamageKind};
pub use faction::{Faction, FactionTable, Reaction};
pub use state::CombatState;
