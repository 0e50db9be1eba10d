//! World entities and their per-instance state

pub mod archetype;
pub mod follow;
pub mod template;
pub mod vehicle;

pub use archetype::Archetype;
pub use follow::FollowSlots;
pub use template::{CreatureFlags, CreatureTemplate};
pub use vehicle::{SeatFlags, Vehicle, VehicleSeat};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::behavior::state::BehaviorState;
use crate::combat::state::CombatState;
use crate::core::types::{EntityId, FactionId, Millis, PhaseMask, SpellId, TemplateEntry, Vec2};
use crate::motion::MotionOrder;
use crate::spatial::sparse_hash::CellCoord;

/// Broad kind of a world entity; cells index membership per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Player-controlled character
    Player,
    /// Autonomous creature driven by a behavior controller
    Creature,
    /// Static interactive object
    GameObject,
    /// Transient effect anchor (persistent area effects)
    DynamicObject,
    /// Remains of a dead player
    Corpse,
}

impl EntityCategory {
    pub const COUNT: usize = 5;

    pub const ALL: [EntityCategory; Self::COUNT] = [
        EntityCategory::Player,
        EntityCategory::Creature,
        EntityCategory::GameObject,
        EntityCategory::DynamicObject,
        EntityCategory::Corpse,
    ];

    #[inline]
    pub fn index(&self) -> usize {
        match self {
            EntityCategory::Player => 0,
            EntityCategory::Creature => 1,
            EntityCategory::GameObject => 2,
            EntityCategory::DynamicObject => 3,
            EntityCategory::Corpse => 4,
        }
    }

    /// Players and creatures can fight, perceive and carry auras
    pub fn is_unit(&self) -> bool {
        matches!(self, EntityCategory::Player | EntityCategory::Creature)
    }
}

/// Set of categories a traversal should enumerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryMask(u8);

impl CategoryMask {
    pub const NONE: CategoryMask = CategoryMask(0);
    pub const PLAYERS: CategoryMask = CategoryMask(1 << 0);
    pub const CREATURES: CategoryMask = CategoryMask(1 << 1);
    pub const GAME_OBJECTS: CategoryMask = CategoryMask(1 << 2);
    pub const DYNAMIC_OBJECTS: CategoryMask = CategoryMask(1 << 3);
    pub const CORPSES: CategoryMask = CategoryMask(1 << 4);
    pub const UNITS: CategoryMask = CategoryMask(0b00011);
    pub const ALL: CategoryMask = CategoryMask(0b11111);

    pub fn of(category: EntityCategory) -> Self {
        CategoryMask(1 << category.index())
    }

    #[inline]
    pub fn contains(&self, category: EntityCategory) -> bool {
        self.0 & (1 << category.index()) != 0
    }

    pub fn with(self, category: EntityCategory) -> Self {
        CategoryMask(self.0 | (1 << category.index()))
    }
}

impl std::ops::BitOr for CategoryMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        CategoryMask(self.0 | rhs.0)
    }
}

/// Binary movement/control conditions of a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitState {
    /// Stunned, feared, charmed away or otherwise not under own control
    pub lost_control: bool,
    /// Riding a transport (taxi flight) and out of reach
    pub in_transit: bool,
    /// Cannot move
    pub rooted: bool,
    /// Remaining time of a timed panic/flee, if any
    pub panic_ms: Option<Millis>,
}

impl UnitState {
    pub fn in_panic(&self) -> bool {
        self.panic_ms.is_some()
    }
}

/// Any simulated world object
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub category: EntityCategory,
    pub entry: TemplateEntry,
    pub name: String,
    pub position: Vec2,
    pub phase: PhaseMask,
    pub faction: FactionId,

    pub alive: bool,
    pub health: u32,
    pub max_health: u32,
    pub combat_reach: f32,

    pub state: UnitState,
    /// Player or a unit owned/charmed by a player
    pub player_controlled: bool,
    pub owner: Option<EntityId>,
    pub charmed_by: Option<EntityId>,
    pub game_master: bool,
    pub invisible: bool,
    pub uninteractible: bool,
    pub mounted: bool,

    /// Per-instance copy of the template flags (death prevention can be toggled)
    pub settings: CreatureFlags,
    pub vehicle: Option<Vehicle>,
    pub follow_slots: FollowSlots,
    pub immunities: AHashSet<SpellId>,

    pub combat: CombatState,
    pub archetype: Archetype,
    /// Present only for entities driven by a behavior controller
    pub behavior: Option<BehaviorState>,

    /// Entities this one currently sees
    pub visible: AHashSet<EntityId>,
    /// Entities currently seeing this one (reverse of `visible`)
    pub(crate) seen_by: AHashSet<EntityId>,
    pub motion: MotionOrder,

    /// Cell currently indexing this entity
    pub(crate) cell: Option<CellCoord>,
}

impl Entity {
    /// Bare entity with neutral defaults; the world assigns the real id
    pub fn new(category: EntityCategory, position: Vec2) -> Self {
        Self {
            id: EntityId::new(0, 0),
            category,
            entry: TemplateEntry(0),
            name: String::new(),
            position,
            phase: PhaseMask::default(),
            faction: FactionId(0),
            alive: true,
            health: 1,
            max_health: 1,
            combat_reach: 1.5,
            state: UnitState::default(),
            player_controlled: category == EntityCategory::Player,
            owner: None,
            charmed_by: None,
            game_master: false,
            invisible: false,
            uninteractible: false,
            mounted: false,
            settings: CreatureFlags::default(),
            vehicle: None,
            follow_slots: FollowSlots::default(),
            immunities: AHashSet::new(),
            combat: CombatState::default(),
            archetype: Archetype::Default,
            behavior: None,
            visible: AHashSet::new(),
            seen_by: AHashSet::new(),
            motion: MotionOrder::Idle,
            cell: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.category == EntityCategory::Player
    }

    pub fn is_creature(&self) -> bool {
        self.category == EntityCategory::Creature
    }

    pub fn is_vehicle(&self) -> bool {
        self.vehicle.is_some()
    }

    pub fn has_ai(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn is_totem(&self) -> bool {
        self.settings.totem
    }

    pub fn is_guard(&self) -> bool {
        self.settings.guard
    }

    pub fn is_civilian(&self) -> bool {
        self.settings.civilian
    }

    pub fn is_in_evade_mode(&self) -> bool {
        self.combat.evading
    }

    /// Dead corpse of a creature (not despawned yet)
    pub fn is_creature_corpse(&self) -> bool {
        self.is_creature() && !self.alive
    }

    /// Player that benefits from this unit's actions (itself, or its owner/charmer)
    pub fn beneficiary(&self) -> Option<EntityId> {
        if self.is_player() {
            Some(self.id)
        } else {
            self.owner.or(self.charmed_by)
        }
    }

    /// Hidden from everyone but itself (GM mode or full invisibility)
    pub fn is_hidden_player(&self) -> bool {
        self.is_player() && (self.game_master || self.invisible)
    }

    pub fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    pub fn seen_by(&self) -> &AHashSet<EntityId> {
        &self.seen_by
    }
}
