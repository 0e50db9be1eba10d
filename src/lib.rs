//! Sightline - perception, area effect and creature behavior core for a persistent world server

pub mod behavior;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod motion;
pub mod simulation;
pub mod spatial;
pub mod spell;
