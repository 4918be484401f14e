//! Volley benchmark: many simultaneous shots of every projectile family

use std::hint::black_box;
use std::path::PathBuf;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use ordnance::core::types::PlayerId;
use ordnance::geometry::WPos;
use ordnance::world::{ActorTemplate, World};
use ordnance::{SimulationConfig, Target, WeaponRules};

const WEAPONS: [&str; 6] = ["cannon", "dragon", "howitzer", "tesla", "cluster_bomb", "napalm_run"];

fn rules() -> Arc<WeaponRules> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("weapons");
    Arc::new(WeaponRules::load_dir(&dir).expect("bundled weapon rules load"))
}

/// Two lines of `per_side` actors facing each other, with every shooter
/// already fired once at the actor across from it
fn volley_world(rules: &Arc<WeaponRules>, per_side: i32) -> World {
    let config = SimulationConfig {
        map_width: 256 * 1024,
        map_height: 256 * 1024,
        ..SimulationConfig::with_seed(42)
    };
    let mut world = World::new(config, rules.clone()).expect("valid config");
    let template = |name: &str| {
        ActorTemplate::new(name)
            .with_health(1_000_000)
            .with_armor("heavy")
            .with_target_types(["Ground", "Vehicle"])
    };

    let mut pairs = Vec::with_capacity(per_side as usize);
    for i in 0..per_side {
        let y = 4096 + i * 768;
        let shooter = world.spawn_actor(template("shooter"), PlayerId(1), WPos::new(8192, y, 0));
        let target = world.spawn_actor(template("target"), PlayerId(2), WPos::new(8192 + 6144, y, 0));
        pairs.push((shooter, target));
    }
    for (i, (shooter, target)) in pairs.into_iter().enumerate() {
        let weapon = WEAPONS[i % WEAPONS.len()];
        world.fire_weapon_named(weapon, shooter, Target::Actor(target));
    }
    world
}

fn bench_volley(c: &mut Criterion) {
    let rules = rules();
    let mut group = c.benchmark_group("volley");

    for per_side in [60, 240] {
        group.bench_function(format!("launch_{per_side}"), |b| {
            b.iter(|| black_box(volley_world(&rules, per_side)))
        });

        group.bench_function(format!("resolve_{per_side}"), |b| {
            b.iter_batched(
                || volley_world(&rules, per_side),
                |mut world| {
                    let mut events = 0;
                    for _ in 0..60 {
                        events += world.tick().len();
                    }
                    black_box(events)
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_steady_tick(c: &mut Criterion) {
    let rules = rules();
    let mut world = volley_world(&rules, 240);
    c.bench_function("tick_with_refire", |b| {
        let mut n = 0u64;
        b.iter(|| {
            // keep the effect list populated
            if n % 20 == 0 {
                let ids: Vec<_> = world.state().actors().map(|a| (a.id, a.owner)).collect();
                let (shooters, targets): (Vec<_>, Vec<_>) = ids.into_iter().partition(|(_, owner)| *owner == PlayerId(1));
                for (i, ((shooter, _), (target, _))) in shooters.iter().zip(&targets).enumerate() {
                    world.fire_weapon_named(WEAPONS[i % WEAPONS.len()], *shooter, Target::Actor(*target));
                }
            }
            n += 1;
            black_box(world.tick().len())
        })
    });
}

criterion_group!(benches, bench_volley, bench_steady_tick);
criterion_main!(benches);
