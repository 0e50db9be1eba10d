//! Sightline - headless scenario runner
//!
//! Builds a small seeded world (wandering players, a guard post, wildlife,
//! a hostile camp and a lingering area spell), drives it for a number of
//! ticks with a toy motion driver, and prints the world events.

use ahash::AHashMap;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use sightline::combat::faction::Faction;
use sightline::core::config::WorldConfig;
use sightline::core::error::Result;
use sightline::core::types::{EffectIndex, EntityId, FactionId, Millis, SpellId, TemplateEntry, Vec2};
use sightline::ecs::world::World;
use sightline::entity::template::{CreatureFlags, CreatureTemplate};
use sightline::motion::{self, MotionOrder};
use sightline::simulation::tick::run_world_tick;
use sightline::spell::area_effect::AreaEffect;
use sightline::spell::info::SpellInfo;

/// Headless world runner
#[derive(Parser, Debug)]
#[command(name = "sightline")]
#[command(about = "Run a seeded perception and behavior scenario and print world events")]
struct Args {
    /// World config (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 100)]
    tick_ms: Millis,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Wildlife and camp creatures to spawn
    #[arg(long, default_value_t = 40)]
    creatures: usize,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

const ALLIANCE: FactionId = FactionId(1);
const WILDLIFE: FactionId = FactionId(2);
const RAIDERS: FactionId = FactionId(3);

const GUARD: u32 = 100;
const DEER: u32 = 101;
const RABBIT: u32 = 102;
const RAIDER: u32 = 103;
const CATAPULT: u32 = 104;

const CONSECRATION: SpellId = SpellId(26573);

/// Units per second for every driven order
const RUN_SPEED: f32 = 7.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("sightline=info")
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    tracing::info!("Sightline starting (seed {})", seed);

    let mut world = World::new(config);
    let players = build_scenario(&mut world, &mut rng, args.creatures)?;
    let mut driver = MotionDriver::default();

    let mut total = 0usize;
    for _ in 0..args.ticks {
        wander(&mut world, &mut rng, &players);
        driver.advance(&mut world, args.tick_ms);

        let events = run_world_tick(&mut world, args.tick_ms);
        total += events.len();
        for event in &events {
            if args.json {
                println!("{}", serde_json::to_string(event)?);
            } else {
                println!("[{:>5}] {:?}", world.current_tick, event);
            }
        }
    }

    tracing::info!(
        "Finished {} ticks: {} entities, {} events",
        world.current_tick,
        world.entity_count(),
        total
    );
    Ok(())
}

fn build_scenario(world: &mut World, rng: &mut ChaCha8Rng, creatures: usize) -> Result<Vec<EntityId>> {
    world.register_faction(Faction::new(ALLIANCE).hostile_to(RAIDERS));
    world.register_faction(Faction::new(WILDLIFE).fleeing_from_calls());
    world.register_faction(Faction::new(RAIDERS).hostile_to(ALLIANCE));

    world.register_template(CreatureTemplate::new(GUARD, "Town Guard", ALLIANCE).with_flags(CreatureFlags {
        guard: true,
        ..Default::default()
    }));
    world.register_template(CreatureTemplate::new(DEER, "Deer", WILDLIFE));
    world.register_template(CreatureTemplate::new(RABBIT, "Rabbit", WILDLIFE).with_flags(CreatureFlags {
        flee_on_melee: true,
        ..Default::default()
    }));
    world.register_template(CreatureTemplate::new(RAIDER, "Bandit", RAIDERS));
    world.register_template(CreatureTemplate::new(CATAPULT, "Siege Catapult", RAIDERS));
    world.register_spell(SpellInfo::new(CONSECRATION.0, "Consecration"));

    for i in 0..4 {
        let angle = i as f32 * std::f32::consts::FRAC_PI_2;
        world.spawn_creature(TemplateEntry(GUARD), Vec2::new(0.0, 0.0).offset(12.0, angle))?;
    }

    for i in 0..creatures {
        let entry = match i % 4 {
            0 => DEER,
            1 => RABBIT,
            _ => RAIDER,
        };
        let position = Vec2::new(rng.gen_range(-150.0..150.0), rng.gen_range(-150.0..150.0));
        world.spawn_creature(TemplateEntry(entry), position)?;
    }
    world.spawn_creature(TemplateEntry(CATAPULT), Vec2::new(90.0, 90.0))?;

    let players: Vec<EntityId> = (0..3)
        .map(|i| world.spawn_player(&format!("Player{}", i + 1), Vec2::new(i as f32 * 4.0, -20.0), ALLIANCE))
        .collect();

    let paladin = players[0];
    world.spawn_area_effect(
        AreaEffect::new(paladin, CONSECRATION, EffectIndex(0), 8.0, 8_000),
        Vec2::new(40.0, 40.0),
    )?;

    tracing::info!("Scenario ready: {} entities", world.entity_count());
    Ok(players)
}

/// Random walk for the players so perception has something to react to
fn wander(world: &mut World, rng: &mut ChaCha8Rng, players: &[EntityId]) {
    for &id in players {
        let Some(player) = world.get(id) else {
            continue;
        };
        if !player.alive {
            continue;
        }
        let step = Vec2::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
        let to = Vec2::new(player.position.x + step.x, player.position.y + step.y);
        world.relocate(id, to);
    }
}

/// Toy stand-in for the motion subsystem
///
/// Moves creatures in straight lines toward their order's goal and reports
/// arrivals back to the core. No pathing, no collision.
#[derive(Default)]
struct MotionDriver {
    homes: AHashMap<EntityId, Vec2>,
    active: AHashMap<EntityId, MotionOrder>,
}

impl MotionDriver {
    fn advance(&mut self, world: &mut World, diff_ms: Millis) {
        for command in world.drain_motion() {
            self.active.insert(command.entity, command.order);
        }
        let step = RUN_SPEED * diff_ms as f32 / 1000.0;

        let mut ids: Vec<EntityId> = self.active.keys().copied().collect();
        ids.sort();
        for id in ids {
            let Some(entity) = world.get(id) else {
                self.active.remove(&id);
                continue;
            };
            let from = entity.position;
            let home = *self.homes.entry(id).or_insert(from);

            let Some(order) = self.active.get(&id).cloned() else {
                continue;
            };
            let arrives = matches!(order, MotionOrder::Retreat { .. } | MotionOrder::Home);
            let (goal, stop_at) = match order {
                MotionOrder::Chase { target, distance, .. } | MotionOrder::Follow { target, distance, .. } => {
                    match world.get(target) {
                        Some(t) => (t.position, distance.max(1.0)),
                        None => {
                            self.active.remove(&id);
                            continue;
                        }
                    }
                }
                MotionOrder::Retreat { destination, .. } => (destination, 0.0),
                MotionOrder::TimedFlee { from: Some(source), .. } => match world.get(source) {
                    Some(s) => (from.offset(step, s.position.angle_to(&from)), 0.0),
                    None => continue,
                },
                MotionOrder::Home => (home, 0.0),
                _ => {
                    self.active.remove(&id);
                    continue;
                }
            };

            let remaining = from.distance(&goal) - stop_at;
            if remaining <= step {
                let end = from.offset(remaining.max(0.0), from.angle_to(&goal));
                world.relocate(id, end);
                if arrives {
                    self.active.remove(&id);
                    motion::arrived(world, id);
                }
            } else {
                world.relocate(id, from.offset(step, from.angle_to(&goal)));
            }
        }
    }
}
