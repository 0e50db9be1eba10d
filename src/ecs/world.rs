//! ECS World - owns every entity and the indexes over them

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::behavior::registry::BehaviorRegistry;
use crate::behavior::state::BehaviorState;
use crate::combat::faction::{Faction, FactionTable};
use crate::core::config::WorldConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{EntityId, FactionId, TemplateEntry, Tick, Vec2};
use crate::entity::template::CreatureTemplate;
use crate::entity::{Archetype, Entity, EntityCategory, Vehicle};
use crate::motion::MotionCommand;
use crate::simulation::events::WorldEvent;
use crate::spatial::los::{LineOfSight, OpenTerrain};
use crate::spatial::sparse_hash::CellGrid;
use crate::spell::area_effect::AreaEffect;
use crate::spell::aura::AuraStore;
use crate::spell::info::{SpellBook, SpellInfo};

struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// The simulated partition containing all entities
pub struct World {
    pub current_tick: Tick,
    config: Arc<WorldConfig>,

    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,

    grid: CellGrid,
    /// Positions reported since the last synchronization point
    pending_moves: AHashMap<EntityId, Vec2>,
    /// Entities whose surroundings changed and need a visibility pass
    movers: AHashSet<EntityId>,

    factions: FactionTable,
    templates: AHashMap<TemplateEntry, CreatureTemplate>,
    spells: SpellBook,
    auras: AuraStore,
    area_effects: AHashMap<EntityId, AreaEffect>,
    behaviors: BehaviorRegistry,
    line_of_sight: Box<dyn LineOfSight>,

    events: Vec<WorldEvent>,
    motion: Vec<MotionCommand>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_config(Arc::new(config))
    }

    /// World sharing an already loaded configuration
    pub fn with_config(config: Arc<WorldConfig>) -> Self {
        Self {
            current_tick: 0,
            grid: CellGrid::new(config.grid_cell_size),
            config,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            pending_moves: AHashMap::new(),
            movers: AHashSet::new(),
            factions: FactionTable::new(),
            templates: AHashMap::new(),
            spells: SpellBook::default(),
            auras: AuraStore::default(),
            area_effects: AHashMap::new(),
            behaviors: BehaviorRegistry::default(),
            line_of_sight: Box::new(OpenTerrain),
            events: Vec::new(),
            motion: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn config_handle(&self) -> Arc<WorldConfig> {
        Arc::clone(&self.config)
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    // === ENTITY TABLE ===

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn entity_count(&self) -> usize {
        self.live
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Live entity ids in table order
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }

    /// Put an entity into the table and index it in its cell
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = match self.free.pop() {
            Some(index) => EntityId::new(index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot { generation: 0, entity: None });
                EntityId::new(self.slots.len() as u32 - 1, 0)
            }
        };

        entity.id = id;
        entity.cell = Some(self.grid.insert(id, entity.category, entity.position));
        self.slots[id.index as usize].entity = Some(entity);
        self.live += 1;
        self.movers.insert(id);
        id
    }

    /// Spawn a creature from a registered template
    pub fn spawn_creature(&mut self, entry: TemplateEntry, position: Vec2) -> Result<EntityId> {
        let template = self
            .templates
            .get(&entry)
            .ok_or(SimError::UnknownTemplate(entry))?;
        if template.combat_reach > self.config.max_combat_reach {
            return Err(SimError::InvalidConfig(format!(
                "template {:?} combat_reach ({}) exceeds max_combat_reach ({})",
                entry, template.combat_reach, self.config.max_combat_reach
            )));
        }

        let mut creature = Entity::new(EntityCategory::Creature, position);
        creature.entry = entry;
        creature.name = template.name.clone();
        creature.faction = template.faction;
        creature.health = template.max_health;
        creature.max_health = template.max_health;
        creature.combat_reach = template.combat_reach;
        creature.settings = template.flags.clone();
        if !template.seats.is_empty() {
            creature.vehicle = Some(Vehicle::with_seats(&template.seats));
        }
        creature.archetype = Archetype::for_template(template);
        creature.behavior = Some(BehaviorState::for_template(template, &self.config, false));

        let id = self.spawn(creature);
        tracing::debug!("spawned {} ({:?}) at {:?}", id, entry, position);
        Ok(id)
    }

    pub fn spawn_player(&mut self, name: &str, position: Vec2, faction: FactionId) -> EntityId {
        let mut player = Entity::new(EntityCategory::Player, position);
        player.name = name.to_string();
        player.faction = faction;
        player.health = 100;
        player.max_health = 100;
        self.spawn(player)
    }

    /// Spawn the anchor object of a persistent area effect
    pub fn spawn_area_effect(&mut self, mut effect: AreaEffect, position: Vec2) -> Result<EntityId> {
        let caster = self.get(effect.caster).ok_or(SimError::EntityNotFound(effect.caster))?;
        if !self.spells.contains(effect.spell) {
            return Err(SimError::UnknownSpell(effect.spell));
        }

        let mut anchor = Entity::new(EntityCategory::DynamicObject, position);
        anchor.phase = caster.phase;
        anchor.faction = caster.faction;
        anchor.owner = Some(effect.caster);

        let id = self.spawn(anchor);
        effect.anchor = id;
        self.area_effects.insert(id, effect);
        Ok(id)
    }

    /// Remove an entity and every reference other entities hold to it
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.get(id) else {
            return false;
        };
        let (category, cell) = (entity.category, entity.cell);
        if let Some(coord) = cell {
            self.grid.remove(id, category, coord);
        }

        let slot = &mut self.slots[id.index as usize];
        slot.entity = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;

        for other in self.slots.iter_mut().filter_map(|slot| slot.entity.as_mut()) {
            other.visible.remove(&id);
            other.seen_by.remove(&id);
            other.combat.forget(id);
            other.follow_slots.relinquish(id);
            if let Some(vehicle) = other.vehicle.as_mut() {
                vehicle.unboard(id);
            }
        }

        self.pending_moves.remove(&id);
        self.movers.remove(&id);
        self.auras.remove_entity(id);
        self.area_effects.remove(&id);

        let orphaned: Vec<EntityId> = self
            .area_effects
            .values()
            .filter(|effect| effect.caster == id)
            .map(|effect| effect.anchor)
            .collect();
        for anchor in orphaned {
            self.despawn(anchor);
        }

        tracing::trace!("despawned {}", id);
        true
    }

    // === MOVEMENT ===

    /// Report a new position; cell membership changes at the next flush
    pub fn relocate(&mut self, id: EntityId, position: Vec2) {
        if self.contains(id) {
            self.pending_moves.insert(id, position);
        }
    }

    /// Synchronization point: apply every pending move and cell transfer
    pub fn flush_relocations(&mut self) -> Vec<EntityId> {
        let mut moves: Vec<(EntityId, Vec2)> = self.pending_moves.drain().collect();
        moves.sort_by_key(|(id, _)| *id);

        let mut moved = Vec::with_capacity(moves.len());
        for (id, position) in moves {
            let Some(entity) = self.slots[id.index as usize].entity.as_mut() else {
                continue;
            };
            entity.position = position;
            entity.cell = Some(match entity.cell {
                Some(from) => self.grid.relocate(id, entity.category, from, position),
                None => self.grid.insert(id, entity.category, position),
            });
            self.movers.insert(id);
            moved.push(id);
        }
        moved
    }

    /// Queue an entity for the next visibility pass
    pub fn mark_moved(&mut self, id: EntityId) {
        if self.contains(id) {
            self.movers.insert(id);
        }
    }

    /// Entities queued for a visibility pass, in id order
    pub fn take_movers(&mut self) -> Vec<EntityId> {
        let mut movers: Vec<EntityId> = self.movers.drain().collect();
        movers.sort();
        movers
    }

    /// Charm a creature; its controller switches to the wider sight range
    pub fn charm(&mut self, id: EntityId, charmer: EntityId) -> bool {
        let charmer_is_player = match self.get(charmer) {
            Some(c) => c.player_controlled,
            None => return false,
        };
        let config = Arc::clone(&self.config);
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        entity.charmed_by = Some(charmer);
        entity.player_controlled = entity.is_player() || charmer_is_player;
        let flags = entity.settings.clone();
        if let Some(state) = entity.behavior.as_mut() {
            state.visibility_distance = BehaviorState::sight_distance(&flags, &config, true);
        }
        self.movers.insert(id);
        true
    }

    // === STATIC DATA ===

    pub fn register_template(&mut self, template: CreatureTemplate) {
        self.templates.insert(template.entry, template);
    }

    pub fn template(&self, entry: TemplateEntry) -> Option<&CreatureTemplate> {
        self.templates.get(&entry)
    }

    pub fn register_faction(&mut self, faction: Faction) {
        self.factions.insert(faction);
    }

    pub fn factions(&self) -> &FactionTable {
        &self.factions
    }

    pub fn register_spell(&mut self, spell: SpellInfo) {
        self.spells.insert(spell);
    }

    pub fn spells(&self) -> &SpellBook {
        &self.spells
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behaviors
    }

    pub fn line_of_sight(&self) -> &dyn LineOfSight {
        self.line_of_sight.as_ref()
    }

    pub fn set_line_of_sight(&mut self, line_of_sight: Box<dyn LineOfSight>) {
        self.line_of_sight = line_of_sight;
    }

    // === AURAS & AREA EFFECTS ===

    pub fn auras(&self) -> &AuraStore {
        &self.auras
    }

    pub fn auras_mut(&mut self) -> &mut AuraStore {
        &mut self.auras
    }

    pub fn area_effect(&self, anchor: EntityId) -> Option<&AreaEffect> {
        self.area_effects.get(&anchor)
    }

    pub fn area_effect_mut(&mut self, anchor: EntityId) -> Option<&mut AreaEffect> {
        self.area_effects.get_mut(&anchor)
    }

    pub fn area_effect_ids(&self) -> Vec<EntityId> {
        self.area_effects.keys().copied().collect()
    }

    pub(crate) fn remove_area_effect(&mut self, anchor: EntityId) -> Option<AreaEffect> {
        self.area_effects.remove(&anchor)
    }

    // === OUTBOXES ===

    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn push_motion(&mut self, command: MotionCommand) {
        self.motion.push(command);
    }

    pub fn drain_motion(&mut self) -> Vec<MotionCommand> {
        std::mem::take(&mut self.motion)
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
