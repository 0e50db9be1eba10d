//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Generational handle into the world's entity table
///
/// The generation is bumped every time a slot is reused, so a stale handle
/// held by a cell, a threat list or a behavior timer never resolves to the
/// wrong entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Duration in milliseconds
pub type Millis = u32;

/// Static template entry (creature or object kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateEntry(pub u32);

/// Spell identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellId(pub u32);

/// Faction template identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

/// Number of effect slots a spell can carry
pub const MAX_EFFECT_INDEX: usize = 3;

/// Index of one effect inside a spell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectIndex(pub u8);

impl EffectIndex {
    pub fn slot(&self) -> usize {
        self.0 as usize
    }

    /// Bit used in per-effect masks
    pub fn mask(&self) -> u8 {
        1 << self.0
    }
}

/// Visibility scoping tag; entities only interact when masks overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseMask(pub u32);

impl PhaseMask {
    pub const NORMAL: PhaseMask = PhaseMask(1);
    pub const ALL: PhaseMask = PhaseMask(u32::MAX);

    #[inline]
    pub fn overlaps(&self, other: PhaseMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for PhaseMask {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    #[inline]
    pub fn distance_sq(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Orientation (radians, 0..2π) of the direction from `self` towards `other`
    pub fn angle_to(&self, other: &Self) -> f32 {
        let angle = (other.y - self.y).atan2(other.x - self.x);
        if angle < 0.0 {
            angle + std::f32::consts::TAU
        } else {
            angle
        }
    }

    /// Point `distance` away from `self` along `angle`
    pub fn offset(&self, distance: f32, angle: f32) -> Self {
        Self {
            x: self.x + distance * angle.cos(),
            y: self.y + distance * angle.sin(),
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
