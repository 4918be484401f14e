//! Homing missiles
//!
//! Every tick a missile re-resolves its guided target, turns its facing
//! and pitch towards it by bounded rates and moves along the result. It
//! detonates close to the target, on hitting the ground, on leaving the
//! map, when a blocker is in the way, or when its fuel runs out.
//!
//! A missile whose target actor has gone keeps flying to the last known
//! position. It then steers directly with no turn limit and snaps onto
//! that position once it is within one tick of horizontal travel, so it
//! always terminates.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use super::{detonate, pick_speed, validate_speeds, GuidedTarget, ShotArgs};
use crate::effects::sprite::body_sprite;
use crate::effects::{
    Contrail, ContrailConfig, ContrailFader, Effect, LaunchContext, Renderable, SpriteConfig, TickContext, TrailConfig,
    TrailEmitter, ViewerContext,
};
use crate::geometry::{tick_facing, WAngle, WDist, WPos, WVec};
use crate::rules::DefError;
use crate::warheads::ImpactTarget;
use crate::world::{blocking_actor_between, WorldState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileConfig {
    /// Cruise speed
    pub speed: WDist,
    /// Speed at launch, one value or a `[min, max]` pair. Empty starts at cruise speed.
    pub launch_speed: Vec<WDist>,
    pub acceleration: WDist,
    pub horizontal_rate_of_turn: WAngle,
    pub vertical_rate_of_turn: WAngle,
    /// Initial pitch
    pub launch_angle: WAngle,
    /// Steepest climb or dive allowed while homing
    pub maximum_pitch: WAngle,
    /// Downward acceleration while in freefall
    pub gravity: WDist,
    /// Fuel as a travel distance. Zero uses the weapon range after range
    /// modifiers, negative is unlimited.
    pub range_limit: WDist,
    /// Detonate when fuel runs out, otherwise drop
    pub explode_when_empty: bool,
    pub close_enough: WDist,
    /// Jump onto the target when it is closer than one tick of travel
    pub allow_snapping: bool,
    /// Ticks of straight flight before homing starts
    pub homing_activation_delay: u32,
    /// Percent chance, rolled once at launch, that the missile tracks its target at all
    pub lock_on_probability: i32,
    pub jammable: bool,
    /// Largest random facing change while jammed
    pub jammed_diversion_range: i32,
    /// Fly half again as fast while the target is airborne
    pub turbo_boost: bool,
    pub sprite: Option<SpriteConfig>,
    pub trail: Option<TrailConfig>,
    pub contrail: Option<ContrailConfig>,
}

impl Default for MissileConfig {
    fn default() -> Self {
        Self {
            speed: WDist(384),
            launch_speed: Vec::new(),
            acceleration: WDist(5),
            horizontal_rate_of_turn: WAngle::new(20),
            vertical_rate_of_turn: WAngle::new(24),
            launch_angle: WAngle::ZERO,
            maximum_pitch: WAngle::new(128),
            gravity: WDist(10),
            range_limit: WDist::ZERO,
            explode_when_empty: true,
            close_enough: WDist(298),
            allow_snapping: false,
            homing_activation_delay: 0,
            lock_on_probability: 100,
            jammable: true,
            jammed_diversion_range: 20,
            turbo_boost: false,
            sprite: None,
            trail: None,
            contrail: None,
        }
    }
}

impl MissileConfig {
    pub fn validate(&self) -> Result<(), DefError> {
        validate_speeds("speed", &[self.speed])?;
        if !self.launch_speed.is_empty() {
            validate_speeds("launch_speed", &self.launch_speed)?;
        }
        if self.acceleration < WDist::ZERO {
            return Err(DefError::invalid("acceleration", "must not be negative"));
        }
        let pitch = self.maximum_pitch.signed_units();
        if !(0..256).contains(&pitch) {
            return Err(DefError::invalid("maximum_pitch", "must be below a quarter turn"));
        }
        if self.close_enough < WDist::ZERO {
            return Err(DefError::invalid("close_enough", "must not be negative"));
        }
        if !(0..=100).contains(&self.lock_on_probability) {
            return Err(DefError::invalid("lock_on_probability", "must be a percentage"));
        }
        if self.jammed_diversion_range < 0 {
            return Err(DefError::invalid("jammed_diversion_range", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Missile {
    info: Arc<MissileConfig>,
    args: ShotArgs,
    guided: GuidedTarget,
    locked_on: bool,
    offset: WVec,
    pos: WPos,
    target_pos: WPos,
    facing: WAngle,
    pitch: WAngle,
    speed: i32,
    /// `None` for unlimited fuel
    range_limit: Option<i64>,
    distance_covered: i64,
    freefall: bool,
    fall_speed: i32,
    ticks: u32,
    trail: Option<TrailEmitter>,
    contrail: Option<Contrail>,
    exploded: bool,
}

impl Missile {
    pub fn new(info: Arc<MissileConfig>, args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Self {
        let samples = ctx.state.config().inaccuracy_samples;
        let offset = args.inaccuracy_offset(ctx.shared_random, samples);
        let speed = if info.launch_speed.is_empty() {
            info.speed.0
        } else {
            pick_speed(&info.launch_speed, ctx.shared_random).0
        };
        let locked_on = ctx.shared_random.percent_chance(info.lock_on_probability);

        let range_limit = match info.range_limit.0 {
            0 => Some(args.weapon_range() as i64),
            limit if limit < 0 => None,
            limit => Some(limit as i64),
        };

        let guided = if locked_on {
            args.guided_target
        } else {
            GuidedTarget::position(args.passive_target)
        };
        trace!(weapon = %args.weapon.name, locked_on, ?offset, "Missile launched");

        Self {
            trail: info.trail.clone().map(TrailEmitter::new),
            contrail: info.contrail.map(Contrail::new),
            pos: args.source,
            target_pos: args.passive_target + offset,
            facing: args.facing,
            pitch: info.launch_angle,
            info,
            guided,
            locked_on,
            offset,
            speed,
            range_limit,
            distance_covered: 0,
            freefall: false,
            fall_speed: 0,
            ticks: 0,
            exploded: false,
            args,
        }
    }

    pub fn position(&self) -> WPos {
        self.pos
    }

    pub fn is_locked_on(&self) -> bool {
        self.locked_on
    }

    fn explode(&mut self, ctx: &mut TickContext<'_>) {
        self.exploded = true;
        ctx.remove_self();
        if let Some(contrail) = self.contrail.take() {
            ctx.add_effect(ContrailFader::new(contrail));
        }
        detonate(ctx, &self.args, ImpactTarget::Position(self.pos), self.pos, self.facing, self.ticks);
    }

    /// First jammer in range that diverts this missile. Each candidate in
    /// range rolls the synchronized stream once.
    fn is_jammed(&self, ctx: &mut TickContext<'_>) -> bool {
        let state: &WorldState = ctx.state();
        for actor in state.actors() {
            let Some(jams) = actor.info.jams_missiles else {
                continue;
            };
            if actor.is_dead() {
                continue;
            }
            let range = jams.range.0 as i64;
            if (actor.position - self.pos).horizontal_length_squared() > range * range {
                continue;
            }
            if !jams
                .deflection_relationships
                .contains(state.relationship(actor.owner, self.args.owner))
            {
                continue;
            }
            if ctx.shared_random().next_below(100) < jams.chance {
                trace!(weapon = %self.args.weapon.name, jammer = %actor.id, "Missile jammed");
                return true;
            }
        }
        false
    }

    fn current_speed(&self) -> i32 {
        if self.info.turbo_boost && self.target_pos.z > 0 {
            self.speed * 3 / 2
        } else {
            self.speed
        }
    }

    /// Turns towards the target and returns this tick's movement
    fn steer(&mut self, ctx: &mut TickContext<'_>, speed: i32) -> WVec {
        let to_target = self.target_pos - self.pos;
        let homing = self.ticks > self.info.homing_activation_delay;

        if homing {
            let mut desired = to_target.yaw();
            if self.info.jammable && self.is_jammed(ctx) {
                let range = self.info.jammed_diversion_range;
                desired = self.facing + WAngle::new(ctx.shared_random().next_range(-range, range + 1));
            }
            self.facing = if self.guided.is_lost() {
                desired
            } else {
                tick_facing(self.facing, desired, self.info.horizontal_rate_of_turn)
            };

            let max_pitch = self.info.maximum_pitch.signed_units();
            let horizontal = to_target.horizontal_length() as i64;
            let desired_pitch = WAngle::arc_tan(to_target.z as i64, horizontal).signed_units();
            let desired_pitch = WAngle::new(desired_pitch.clamp(-max_pitch, max_pitch));
            self.pitch = if self.guided.is_lost() {
                desired_pitch
            } else {
                tick_facing(self.pitch, desired_pitch, self.info.vertical_rate_of_turn)
            };
        }

        let horizontal_speed = (speed as i64 * self.pitch.cos() as i64 / 1024) as i32;
        let mut movement = WVec::from_yaw(self.facing, horizontal_speed);
        movement.z = (speed as i64 * self.pitch.sin() as i64 / 1024) as i32;
        movement
    }
}

impl Effect for Missile {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        debug_assert!(!self.exploded, "exploded missile ticked again");
        if self.exploded {
            return;
        }
        self.ticks += 1;

        self.target_pos = self.guided.update(ctx.state()) + self.offset;
        if self.speed < self.info.speed.0 {
            self.speed = (self.speed + self.info.acceleration.0).min(self.info.speed.0);
        }
        let speed = self.current_speed();

        let out_of_fuel = self.range_limit.is_some_and(|limit| self.distance_covered > limit);
        if out_of_fuel && self.info.explode_when_empty {
            trace!(weapon = %self.args.weapon.name, "Missile out of fuel");
            self.explode(ctx);
            return;
        }
        self.freefall |= out_of_fuel;

        let movement = if self.freefall {
            self.fall_speed -= self.info.gravity.0;
            let mut movement = WVec::from_yaw(self.facing, speed);
            movement.z = self.fall_speed;
            movement
        } else {
            self.steer(ctx, speed)
        };

        let last = self.pos;
        let to_target = self.target_pos - self.pos;
        let mut arrived = false;
        if !self.freefall && self.guided.is_lost() && to_target.horizontal_length() <= movement.horizontal_length() {
            self.pos = self.target_pos;
            arrived = true;
        } else if !self.freefall && self.info.allow_snapping && to_target.length() < movement.length() {
            self.pos = self.target_pos;
            arrived = true;
        } else {
            self.pos += movement;
        }
        self.distance_covered += speed as i64;

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
                trace!(weapon = %self.args.weapon.name, %blocker, "Missile blocked");
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

        let hit_ground = self.pos.z < 0;
        if hit_ground {
            self.pos.z = 0;
        }
        let close_enough = (self.target_pos - self.pos).length() < self.info.close_enough.0;
        let off_map = !ctx.state().contains(self.pos);
        if arrived || hit_ground || close_enough || off_map {
            trace!(
                weapon = %self.args.weapon.name,
                arrived,
                hit_ground,
                close_enough,
                off_map,
                "Missile detonating"
            );
            self.explode(ctx);
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
                body_sprite(sprite, sequence, self.pos, self.facing, self.ticks)
            });
        let contrail = self.contrail.as_ref().and_then(|c| c.render(viewer));
        Box::new(body.into_iter().chain(contrail))
    }

    fn kind(&self) -> &'static str {
        "missile"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{PlayerId, RelationshipSet};
    use crate::projectiles::Target;
    use crate::rules::WeaponRules;
    use crate::world::{ActorTemplate, JamsMissiles, World};

    const RULES: &str = r#"
        [weapons.dragon]
        range = 20480
        [weapons.dragon.projectile]
        type = "Missile"
        speed = 256
        horizontal_rate_of_turn = 64
        jammable = false
        [[weapons.dragon.warheads]]
        type = "SpreadDamage"
        damage = 100

        [weapons.stinger]
        range = 512
        [weapons.stinger.projectile]
        type = "Missile"
        speed = 128
        close_enough = 0
        [[weapons.stinger.warheads]]
        type = "SpreadDamage"
        damage = 100
    "#;

    fn world() -> World {
        let rules = WeaponRules::from_toml_str(RULES).unwrap();
        World::new(SimulationConfig::with_seed(11), Arc::new(rules)).unwrap()
    }

    #[test]
    fn test_missile_follows_moving_target() {
        let mut w = world();
        let firer = w.spawn_actor(ActorTemplate::new("launcher"), PlayerId(1), WPos::new(2048, 2048, 0));
        let target = w.spawn_actor(
            ActorTemplate::new("jeep").with_health(1000),
            PlayerId(2),
            WPos::new(2048 + 4096, 2048, 0),
        );
        w.fire_weapon_named("dragon", firer, Target::Actor(target));
        w.tick();
        w.move_actor(target, WPos::new(2048 + 4096, 2048 + 1024, 0));

        let mut exploded = false;
        for _ in 0..60 {
            w.tick();
            if w.effect_count() == 0 {
                exploded = true;
                break;
            }
        }
        assert!(exploded);
        assert!(w.actor(target).unwrap().health.unwrap().hp < 1000);
    }

    #[test]
    fn test_fuel_runs_out() {
        let mut w = world();
        let firer = w.spawn_actor(ActorTemplate::new("launcher"), PlayerId(1), WPos::new(2048, 2048, 0));
        w.fire_weapon_named("stinger", firer, Target::Position(WPos::new(2048 + 8192, 2048, 0)));

        // 512 of fuel at 128 per tick: gone after the fifth move
        for _ in 0..5 {
            w.tick();
            assert_eq!(w.effect_count(), 1);
        }
        w.tick();
        assert_eq!(w.effect_count(), 0);
    }

    #[test]
    fn test_jammer_diverts_missile() {
        let run = |jammer: bool| {
            let mut w = world();
            let firer = w.spawn_actor(ActorTemplate::new("launcher"), PlayerId(1), WPos::new(2048, 2048, 0));
            if jammer {
                w.spawn_actor(
                    ActorTemplate::new("jammer").jamming(JamsMissiles {
                        range: WDist(8192),
                        chance: 100,
                        deflection_relationships: RelationshipSet::ALL,
                    }),
                    PlayerId(2),
                    WPos::new(4096, 4096, 0),
                );
            }
            w.fire_weapon_named("stinger", firer, Target::Position(WPos::new(2048 + 8192, 2048, 0)));
            let draws = w.shared_random_draws();
            w.tick();
            w.tick();
            (w.snapshot().effects[0].position, w.shared_random_draws() - draws)
        };
        let (clean, clean_draws) = run(false);
        let (_, jammed_draws) = run(true);
        assert_eq!(clean, Some(WPos::new(2048 + 256, 2048, 0)));
        assert_eq!(clean_draws, 0);
        // one chance roll and one diversion per tick
        assert_eq!(jammed_draws, 4);
    }

    #[test]
    fn test_config_validation() {
        assert!(MissileConfig::default().validate().is_ok());
        let bad = MissileConfig {
            lock_on_probability: 150,
            ..MissileConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
