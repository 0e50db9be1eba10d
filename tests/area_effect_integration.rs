//! Area effect integration tests, driven through the world tick

use sightline::combat::faction::Faction;
use sightline::core::config::WorldConfig;
use sightline::core::types::{EffectIndex, EntityId, FactionId, SpellId, TemplateEntry, Vec2};
use sightline::ecs::world::World;
use sightline::entity::template::CreatureTemplate;
use sightline::simulation::events::WorldEvent;
use sightline::simulation::tick::run_world_tick;
use sightline::spell::area_effect::{update_area_effect, AreaEffect};
use sightline::spell::info::SpellInfo;

const FLAMESTRIKE: SpellId = SpellId(2120);

fn setup() -> (World, EntityId) {
    let mut world = World::new(WorldConfig::default());
    world.register_faction(Faction::new(FactionId(1)).hostile_to(FactionId(2)));
    world.register_faction(Faction::new(FactionId(2)));
    world.register_template(CreatureTemplate::new(1, "Ghoul", FactionId(2)));
    world.register_spell(SpellInfo::new(FLAMESTRIKE.0, "Flamestrike"));
    let caster = world.spawn_player("Kael", Vec2::new(0.0, 0.0), FactionId(1));
    (world, caster)
}

fn count(events: &[WorldEvent], pred: impl Fn(&WorldEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn test_repeated_pulses_keep_one_aura() {
    let (mut world, caster) = setup();
    let ghoul = world.spawn_creature(TemplateEntry(1), Vec2::new(30.0, 0.0)).unwrap();
    world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 5000), Vec2::new(30.0, 0.0))
        .unwrap();

    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(run_world_tick(&mut world, 100));
    }

    assert_eq!(world.auras().on_target(ghoul).len(), 1);
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::AuraApplied { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::CasterHitTarget { .. })), 1);
    // Aura and anchor age together: nothing is ever strictly longer
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::AuraRefreshed { .. })), 0);
}

#[test]
fn test_longer_anchor_refreshes_shorter_never_shortens() {
    let (mut world, caster) = setup();
    let ghoul = world.spawn_creature(TemplateEntry(1), Vec2::new(30.0, 0.0)).unwrap();
    let short = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 3000), Vec2::new(30.0, 0.0))
        .unwrap();
    let long = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 7000), Vec2::new(31.0, 0.0))
        .unwrap();

    update_area_effect(&mut world, short);
    assert_eq!(world.auras().get(ghoul, FLAMESTRIKE, caster).unwrap().duration_ms, 3000);

    update_area_effect(&mut world, long);
    assert_eq!(world.auras().get(ghoul, FLAMESTRIKE, caster).unwrap().duration_ms, 7000);
    assert!(world.events().contains(&WorldEvent::AuraRefreshed {
        target: ghoul,
        caster,
        spell: FLAMESTRIKE,
        duration_ms: 7000,
    }));

    update_area_effect(&mut world, short);
    assert_eq!(world.auras().get(ghoul, FLAMESTRIKE, caster).unwrap().duration_ms, 7000);
    assert_eq!(world.auras().on_target(ghoul).len(), 1);

    // Each anchor records its own first hit
    let hits = count(world.events(), |e| matches!(e, WorldEvent::CasterHitTarget { .. }));
    assert_eq!(hits, 2);
}

#[test]
fn test_anchor_expiry_removes_aura_and_anchor() {
    let (mut world, caster) = setup();
    let ghoul = world.spawn_creature(TemplateEntry(1), Vec2::new(30.0, 0.0)).unwrap();
    let anchor = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 300), Vec2::new(30.0, 0.0))
        .unwrap();

    let mut events = Vec::new();
    for _ in 0..3 {
        events.extend(run_world_tick(&mut world, 100));
    }

    assert!(world.auras().on_target(ghoul).is_empty());
    assert!(world.get(anchor).is_none());
    assert!(events.contains(&WorldEvent::AreaEffectExpired { anchor, spell: FLAMESTRIKE }));
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::AuraRemoved { .. })), 1);
}

#[test]
fn test_target_entering_later_is_picked_up() {
    let (mut world, caster) = setup();
    let ghoul = world.spawn_creature(TemplateEntry(1), Vec2::new(80.0, 0.0)).unwrap();
    world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 5000), Vec2::new(30.0, 0.0))
        .unwrap();

    run_world_tick(&mut world, 100);
    assert!(world.auras().on_target(ghoul).is_empty());

    world.relocate(ghoul, Vec2::new(32.0, 0.0));
    let events = run_world_tick(&mut world, 100);
    assert!(world.auras().get(ghoul, FLAMESTRIKE, caster).is_some());
    assert!(events.contains(&WorldEvent::CasterHitTarget { caster, target: ghoul, spell: FLAMESTRIKE }));
}

#[test]
fn test_caster_despawn_removes_its_anchors() {
    let (mut world, caster) = setup();
    let anchor = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 5000), Vec2::new(30.0, 0.0))
        .unwrap();

    world.despawn(caster);
    assert!(world.get(anchor).is_none());
    assert!(world.area_effect(anchor).is_none());
}

#[test]
fn test_unknown_spell_or_caster_is_rejected() {
    let (mut world, caster) = setup();
    let bad_spell = AreaEffect::new(caster, SpellId(1), EffectIndex(0), 6.0, 5000);
    assert!(world.spawn_area_effect(bad_spell, Vec2::new(0.0, 0.0)).is_err());

    let ghost = EntityId::new(999, 0);
    let bad_caster = AreaEffect::new(ghost, FLAMESTRIKE, EffectIndex(0), 6.0, 5000);
    assert!(world.spawn_area_effect(bad_caster, Vec2::new(0.0, 0.0)).is_err());
}

#[test]
fn test_overlapping_anchor_keeps_aura_when_other_expires() {
    let (mut world, caster) = setup();
    let ghoul = world.spawn_creature(TemplateEntry(1), Vec2::new(30.0, 0.0)).unwrap();
    let short = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 1000), Vec2::new(30.0, 0.0))
        .unwrap();
    let long = world
        .spawn_area_effect(AreaEffect::new(caster, FLAMESTRIKE, EffectIndex(0), 6.0, 5000), Vec2::new(31.0, 0.0))
        .unwrap();

    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(run_world_tick(&mut world, 100));
    }
    assert!(world.get(short).is_none());
    assert!(world.get(long).is_some());
    assert!(world.auras().get(ghoul, FLAMESTRIKE, caster).is_some());
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::AuraRemoved { .. })), 0);

    let events = run_world_tick(&mut world, 100);
    assert_eq!(count(&events, |e| matches!(e, WorldEvent::AuraApplied { .. })), 0);
    assert_eq!(world.auras().on_target(ghoul).len(), 1);
}
