//! Spell data, applied auras and persistent area effects

pub mod area_effect;
pub mod aura;
pub mod info;

pub use area_effect::AreaEffect;
pub use aura::{AuraHolder, AuraStore};
pub use info::{SpellInfo, SpellBook, CALL_GUARDS};
