//! Ballistic projectiles
//!
//! A bullet interpolates from its source to a fixed destination (the
//! passive target plus the inaccuracy offset) over `ceil(distance / speed)`
//! ticks, optionally along a parabolic arc set by the launch angle. It can
//! bounce a limited number of times before the warheads are applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

use super::{detonate, flight_length, pick_angle, pick_speed, validate_speeds, ShotArgs};
use crate::effects::sprite::body_sprite;
use crate::effects::{
    Contrail, ContrailConfig, ContrailFader, Effect, LaunchContext, Renderable, SpriteConfig, TickContext, TrailConfig,
    TrailEmitter, ViewerContext,
};
use crate::geometry::{WAngle, WDist, WPos};
use crate::rules::DefError;
use crate::warheads::impact::actors_in_range;
use crate::warheads::ImpactTarget;
use crate::world::{blocking_actor_between, FrameEndTask};

fn default_speed() -> Vec<WDist> {
    vec![WDist(256)]
}

fn default_launch_angle() -> Vec<WAngle> {
    vec![WAngle::ZERO]
}

fn default_bounce_modifier() -> i32 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// One value, or a `[min, max]` pair drawn per shot
    pub speed: Vec<WDist>,
    /// Arc pitch at launch. Zero flies straight.
    pub launch_angle: Vec<WAngle>,
    pub bounce_count: u32,
    /// Length of each bounce as a percentage of the previous leg
    pub bounce_range_modifier: i32,
    pub bounce_sounds: Vec<String>,
    /// Terrain types the bullet explodes on instead of bouncing
    pub invalid_bounce_terrain: BTreeSet<String>,
    /// Detonate this far above the target
    pub airburst_altitude: WDist,
    pub sprite: Option<SpriteConfig>,
    pub trail: Option<TrailConfig>,
    pub contrail: Option<ContrailConfig>,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            launch_angle: default_launch_angle(),
            bounce_count: 0,
            bounce_range_modifier: default_bounce_modifier(),
            bounce_sounds: Vec::new(),
            invalid_bounce_terrain: BTreeSet::new(),
            airburst_altitude: WDist::ZERO,
            sprite: None,
            trail: None,
            contrail: None,
        }
    }
}

impl BulletConfig {
    pub fn validate(&self) -> Result<(), DefError> {
        validate_speeds("speed", &self.speed)?;
        if self.launch_angle.is_empty() || self.launch_angle.len() > 2 {
            return Err(DefError::invalid("launch_angle", "needs one value or a [min, max] pair"));
        }
        if self.launch_angle.iter().any(|a| !(0..256).contains(&a.signed_units())) {
            return Err(DefError::invalid("launch_angle", "must be below a quarter turn and not negative"));
        }
        if let [min, max] = self.launch_angle[..] {
            if max.units() < min.units() {
                return Err(DefError::invalid("launch_angle", "max is below min"));
            }
        }
        if self.bounce_range_modifier < 0 {
            return Err(DefError::invalid("bounce_range_modifier", "must not be negative"));
        }
        if self.airburst_altitude < WDist::ZERO {
            return Err(DefError::invalid("airburst_altitude", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Bullet {
    info: Arc<BulletConfig>,
    args: ShotArgs,
    speed: WDist,
    angle: WAngle,
    facing: WAngle,
    source: WPos,
    target: WPos,
    pos: WPos,
    length: i64,
    ticks: i64,
    /// Ticks since launch, across bounces
    age: u32,
    remaining_bounces: u32,
    trail: Option<TrailEmitter>,
    contrail: Option<Contrail>,
    exploded: bool,
}

impl Bullet {
    pub fn new(info: Arc<BulletConfig>, args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Self {
        let speed = pick_speed(&info.speed, ctx.shared_random);
        let angle = pick_angle(&info.launch_angle, ctx.shared_random);

        let samples = ctx.state.config().inaccuracy_samples;
        let mut target = args.passive_target + args.inaccuracy_offset(ctx.shared_random, samples);
        if info.airburst_altitude > WDist::ZERO {
            target.z += info.airburst_altitude.0;
        }

        let source = args.source;
        let facing = if target == source {
            args.facing
        } else {
            (target - source).yaw()
        };
        let length = flight_length(source, target, speed);
        trace!(weapon = %args.weapon.name, ?target, speed = speed.0, length, "Bullet launched");

        Self {
            trail: info.trail.clone().map(TrailEmitter::new),
            contrail: info.contrail.map(Contrail::new),
            remaining_bounces: info.bounce_count,
            info,
            args,
            speed,
            angle,
            facing,
            source,
            target,
            pos: source,
            length,
            ticks: 0,
            age: 0,
            exploded: false,
        }
    }

    /// Where the bullet will land on its current leg
    pub fn destination(&self) -> WPos {
        self.target
    }

    pub fn flight_ticks(&self) -> i64 {
        self.length
    }

    fn explode(&mut self, ctx: &mut TickContext<'_>) {
        self.exploded = true;
        ctx.remove_self();
        if let Some(contrail) = self.contrail.take() {
            ctx.add_effect(ContrailFader::new(contrail));
        }
        detonate(ctx, &self.args, ImpactTarget::Position(self.pos), self.pos, self.facing, self.age);
    }

    /// Whether the landing spot lets the bullet bounce again
    fn can_bounce(&self, ctx: &TickContext<'_>) -> bool {
        if self.remaining_bounces == 0 {
            return false;
        }
        let state = ctx.state();
        if !state.contains(self.pos) {
            return false;
        }
        if self.info.invalid_bounce_terrain.contains(state.terrain().type_at(self.pos)) {
            return false;
        }
        let width = self.args.projectile().width;
        let weapon = &self.args.weapon;
        !actors_in_range(state, self.pos, width)
            .into_iter()
            .any(|actor| actor.id != self.args.source_actor && !actor.is_dead() && weapon.is_valid_against(actor.target_types()))
    }

    fn bounce(&mut self, ctx: &mut TickContext<'_>) {
        let leg = self.pos - self.source;
        let next = self.pos + leg * self.info.bounce_range_modifier / 100;
        self.source = self.pos;
        self.target = next.with_z(0);
        self.length = flight_length(self.source, self.target, self.speed);
        self.ticks = 0;
        self.remaining_bounces -= 1;
        trace!(weapon = %self.args.weapon.name, pos = ?self.pos, target = ?self.target, "Bullet bounced");

        let sound = ctx.cosmetic_random().pick(&self.info.bounce_sounds).cloned();
        if let Some(sound) = sound {
            ctx.add_frame_end_task(FrameEndTask::PlaySound {
                sound,
                position: self.pos,
            });
        }
    }
}

impl Effect for Bullet {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        debug_assert!(!self.exploded, "exploded bullet ticked again");
        if self.exploded {
            return;
        }

        let last = self.pos;
        self.ticks += 1;
        self.age += 1;
        self.pos = WPos::lerp_quadratic(self.source, self.target, self.angle, self.ticks, self.length);

        let projectile = self.args.projectile();
        if projectile.blockable {
            let blocker = blocking_actor_between(
                ctx.state(),
                self.args.owner,
                last,
                self.pos,
                projectile.width,
                Some(self.args.source_actor),
            );
            if let Some((blocker, hit)) = blocker {
                trace!(weapon = %self.args.weapon.name, %blocker, "Bullet blocked");
                self.pos = hit;
                self.explode(ctx);
                return;
            }
        }

        if let Some(trail) = self.trail.as_mut() {
            trail.tick(ctx, self.pos, self.facing);
        }
        if let Some(contrail) = self.contrail.as_mut() {
            contrail.update(self.pos);
        }

        if self.ticks >= self.length {
            if self.can_bounce(ctx) {
                self.bounce(ctx);
            } else {
                self.explode(ctx);
            }
        }
    }

    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        let body = self
            .info
            .sprite
            .as_ref()
            .filter(|_| !self.exploded && !viewer.obscures(self.pos))
            .map(|sprite| {
                let sequence = sprite.sequences.first().map_or("idle", String::as_str);
                body_sprite(sprite, sequence, self.pos, self.facing, self.age)
            });
        let contrail = self.contrail.as_ref().and_then(|c| c.render(viewer));
        Box::new(body.into_iter().chain(contrail))
    }

    fn kind(&self) -> &'static str {
        "bullet"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::PlayerId;
    use crate::projectiles::Target;
    use crate::rules::WeaponRules;
    use crate::world::{ActorTemplate, SimEvent, World};

    const RULES: &str = r#"
        [weapons.shell]
        range = 8192
        [weapons.shell.projectile]
        type = "Bullet"
        speed = [100]
        [[weapons.shell.warheads]]
        type = "TargetDamage"
        damage = 50
        spread = 256

        [weapons.skipper]
        range = 8192
        [weapons.skipper.projectile]
        type = "Bullet"
        speed = [200]
        bounce_count = 1
        bounce_range_modifier = 50
        [[weapons.skipper.warheads]]
        type = "TargetDamage"
        damage = 50
        spread = 256
    "#;

    fn world() -> World {
        let rules = WeaponRules::from_toml_str(RULES).unwrap();
        World::new(SimulationConfig::with_seed(3), Arc::new(rules)).unwrap()
    }

    #[test]
    fn test_bullet_lands_on_target_after_rounded_up_ticks() {
        let mut w = world();
        let firer = w.spawn_actor(ActorTemplate::new("tank"), PlayerId(1), WPos::new(1024, 1024, 0));
        let victim = w.spawn_actor(
            ActorTemplate::new("jeep").with_health(100),
            PlayerId(2),
            WPos::new(1024 + 1050, 1024, 0),
        );

        w.fire_weapon_named("shell", firer, Target::Actor(victim));
        let mut damaged_at = None;
        for t in 1..=20u64 {
            let events = w.tick();
            if events.iter().any(|e| matches!(e, SimEvent::ActorDamaged { actor, .. } if *actor == victim)) {
                damaged_at = Some(t);
                break;
            }
        }
        // 1050 / 100 rounds up to 11 ticks
        assert_eq!(damaged_at, Some(11));
        assert_eq!(w.effect_count(), 0);
    }

    #[test]
    fn test_bounce_extends_flight() {
        let mut w = world();
        let firer = w.spawn_actor(ActorTemplate::new("tank"), PlayerId(1), WPos::new(1024, 1024, 0));
        w.fire_weapon_named("skipper", firer, Target::Position(WPos::new(1024 + 2000, 1024, 0)));

        for _ in 0..10 {
            w.tick();
        }
        // first leg done, bounce leg of 1000 units still in flight
        assert_eq!(w.effect_count(), 1);
        assert_eq!(w.snapshot().effects[0].position, Some(WPos::new(3024, 1024, 0)));

        for _ in 0..5 {
            w.tick();
        }
        assert_eq!(w.effect_count(), 0);
    }

    #[test]
    fn test_config_rejects_bad_speed() {
        let config = BulletConfig {
            speed: vec![WDist(0)],
            ..BulletConfig::default()
        };
        assert!(matches!(config.validate(), Err(DefError::Invalid { field: "speed", .. })));
    }

    #[test]
    fn test_config_rejects_steep_or_inverted_launch_angle() {
        let with_angles = |angles: &[i32]| BulletConfig {
            launch_angle: angles.iter().map(|&a| WAngle::new(a)).collect(),
            ..BulletConfig::default()
        };
        assert!(with_angles(&[255]).validate().is_ok());
        assert!(with_angles(&[32, 128]).validate().is_ok());
        for bad in [&[256][..], &[1000], &[128, 64], &[0, 300]] {
            assert!(
                matches!(with_angles(bad).validate(), Err(DefError::Invalid { field: "launch_angle", .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
