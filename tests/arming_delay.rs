//! Impacts before the arming delay has elapsed do nothing

use std::sync::Arc;

use ordnance::core::types::PlayerId;
use ordnance::geometry::WPos;
use ordnance::world::{ActorTemplate, SimEvent, World};
use ordnance::{SimulationConfig, Target, WeaponRules};

const RULES: &str = r#"
    [weapons.grenade]
    range = 8192

    [weapons.grenade.projectile]
    type = "Bullet"
    speed = [256]
    arming_delay = 5

    [[weapons.grenade.warheads]]
    type = "SpreadDamage"
    damage = 40
    spread = 128
    falloff = [100, 100]

    [weapons.zapper]
    range = 4096

    [weapons.zapper.projectile]
    type = "Beam"
    arming_delay = 2

    [[weapons.zapper.warheads]]
    type = "TargetDamage"
    damage = 40
"#;

fn world() -> World {
    let rules = WeaponRules::from_toml_str(RULES).unwrap();
    World::new(SimulationConfig::with_seed(21), Arc::new(rules)).unwrap()
}

/// Fires at a dummy `distance` away and returns the damage it took
fn damage_at_distance(weapon: &str, distance: i32) -> i32 {
    let mut w = world();
    let firer = w.spawn_actor(ActorTemplate::new("grenadier"), PlayerId(1), WPos::new(2048, 2048, 0));
    let dummy = w.spawn_actor(
        ActorTemplate::new("dummy").with_health(100),
        PlayerId(2),
        WPos::new(2048 + distance, 2048, 0),
    );
    w.fire_weapon_named(weapon, firer, Target::Actor(dummy));

    let mut taken = 0;
    for _ in 0..40 {
        for event in w.tick() {
            if let SimEvent::ActorDamaged { actor, amount, .. } = event {
                if actor == dummy {
                    taken += amount;
                }
            }
        }
        if w.effect_count() == 0 {
            break;
        }
    }
    assert_eq!(w.effect_count(), 0, "projectile must still be removed");
    taken
}

#[test]
fn test_impact_before_arming_is_suppressed() {
    // 2 and 4 ticks of flight
    assert_eq!(damage_at_distance("grenade", 512), 0);
    assert_eq!(damage_at_distance("grenade", 1024), 0);
}

#[test]
fn test_impact_at_or_after_arming_applies_full_damage() {
    // 5 ticks: exactly the arming delay
    assert_eq!(damage_at_distance("grenade", 1280), 40);
    // 6 ticks
    assert_eq!(damage_at_distance("grenade", 1536), 40);
}

#[test]
fn test_instant_beam_inside_arming_delay_never_hits() {
    assert_eq!(damage_at_distance("zapper", 1024), 0);
}
