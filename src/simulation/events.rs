//! Events recorded during a tick for the external subsystems and the log

use serde::{Deserialize, Serialize};

use crate::core::types::{EffectIndex, EntityId, Millis, SpellId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// `observer` started seeing `target`
    VisibilityGained { observer: EntityId, target: EntityId },
    /// `observer` stopped seeing `target`
    VisibilityLost { observer: EntityId, target: EntityId },
    /// A unit entered combat against `enemy`
    EnteredCombat { entity: EntityId, enemy: Option<EntityId> },
    /// Guard or civilian broadcast for the local defense channel
    ZoneUnderAttack { defender: EntityId, attacker: EntityId },
    /// Request for the spell subsystem to cast a spell
    SpellCast { caster: EntityId, target: Option<EntityId>, spell: SpellId },
    /// A new aura holder was created, or an effect component attached to one
    AuraApplied { target: EntityId, caster: EntityId, spell: SpellId, effect: EffectIndex },
    /// An existing aura holder got a longer duration
    AuraRefreshed { target: EntityId, caster: EntityId, spell: SpellId, duration_ms: Millis },
    /// An aura holder ran out or lost its last effect
    AuraRemoved { target: EntityId, caster: EntityId, spell: SpellId },
    /// First hit of an area effect on a target (on-hit procs run once)
    CasterHitTarget { caster: EntityId, target: EntityId, spell: SpellId },
    /// An area effect anchor expired
    AreaEffectExpired { anchor: EntityId, spell: SpellId },
    /// Lethal damage was absorbed by an unkillable unit
    DeathPrevented { entity: EntityId, dealer: Option<EntityId> },
    Died { entity: EntityId, killer: Option<EntityId> },
    FakeDeath { entity: EntityId },
    /// Timed panic started
    Fled { entity: EntityId, duration_ms: Millis },
    RetreatStarted { entity: EntityId, ally: EntityId },
    AssistanceCalled { entity: EntityId, helpers: usize },
    EvadeStarted { entity: EntityId },
    EvadeFinished { entity: EntityId },
}

impl WorldEvent {
    /// Entity the event is primarily about
    pub fn subject(&self) -> EntityId {
        match self {
            WorldEvent::VisibilityGained { observer, .. } => *observer,
            WorldEvent::VisibilityLost { observer, .. } => *observer,
            WorldEvent::EnteredCombat { entity, .. } => *entity,
            WorldEvent::ZoneUnderAttack { defender, .. } => *defender,
            WorldEvent::SpellCast { caster, .. } => *caster,
            WorldEvent::AuraApplied { target, .. } => *target,
            WorldEvent::AuraRefreshed { target, .. } => *target,
            WorldEvent::AuraRemoved { target, .. } => *target,
            WorldEvent::CasterHitTarget { target, .. } => *target,
            WorldEvent::AreaEffectExpired { anchor, .. } => *anchor,
            WorldEvent::DeathPrevented { entity, .. } => *entity,
            WorldEvent::Died { entity, .. } => *entity,
            WorldEvent::FakeDeath { entity } => *entity,
            WorldEvent::Fled { entity, .. } => *entity,
            WorldEvent::RetreatStarted { entity, .. } => *entity,
            WorldEvent::AssistanceCalled { entity, .. } => *entity,
            WorldEvent::EvadeStarted { entity } => *entity,
            WorldEvent::EvadeFinished { entity } => *entity,
        }
    }
}
