//! Sustained area beams
//!
//! The head travels from the firer towards the target (plus an overshoot)
//! at a fixed speed. The tail stays on the firer until the burst ends, the
//! firer dies or the target leaves range, then follows along the same path.
//! Every `damage_interval` ticks each actor on the tail-head segment takes
//! an impact scaled by its distance from the source.

use serde::Deserialize;
use std::sync::Arc;
use tracing::trace;

use super::{flight_length, impact_if_armed, pick_speed, validate_speeds, GuidedTarget, ShotArgs};
use crate::effects::{BeamRenderShape, Color, Effect, LaunchContext, Renderable, TickContext, ViewerContext};
use crate::geometry::{WAngle, WDist, WPos, WVec};
use crate::rules::DefError;
use crate::warheads::{FalloffCurve, ImpactTarget};
use crate::world::blocking_actor_between;

fn default_speed() -> Vec<WDist> {
    vec![WDist(128)]
}

fn default_falloff() -> Vec<i32> {
    vec![100, 100]
}

fn default_falloff_range() -> Vec<WDist> {
    vec![WDist::ZERO, WDist(i32::MAX)]
}

/// Declared form of [`AreaBeamConfig`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AreaBeamDef {
    pub speed: Vec<WDist>,
    pub duration: u32,
    pub damage_interval: u32,
    pub width: WDist,
    pub render_shape: BeamRenderShape,
    pub beyond_target_range: WDist,
    pub min_distance: WDist,
    pub falloff: Vec<i32>,
    pub range: Vec<WDist>,
    pub track_target: bool,
    pub render_beam: bool,
    pub color: Color,
}

impl Default for AreaBeamDef {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            duration: 10,
            damage_interval: 3,
            width: WDist(512),
            render_shape: BeamRenderShape::Cylindrical,
            beyond_target_range: WDist::ZERO,
            min_distance: WDist::ZERO,
            falloff: default_falloff(),
            range: default_falloff_range(),
            track_target: false,
            render_beam: true,
            color: Color::RED,
        }
    }
}

impl AreaBeamDef {
    pub fn freeze(self) -> Result<AreaBeamConfig, DefError> {
        validate_speeds("speed", &self.speed)?;
        if self.damage_interval == 0 {
            return Err(DefError::invalid("damage_interval", "must be at least 1"));
        }
        if self.width < WDist::ZERO {
            return Err(DefError::invalid("width", "must not be negative"));
        }
        let falloff = FalloffCurve::new(self.range, self.falloff).map_err(DefError::Falloff)?;
        Ok(AreaBeamConfig {
            speed: self.speed,
            duration: self.duration,
            damage_interval: self.damage_interval,
            width: self.width,
            render_shape: self.render_shape,
            beyond_target_range: self.beyond_target_range,
            min_distance: self.min_distance,
            falloff,
            track_target: self.track_target,
            render_beam: self.render_beam,
            color: self.color,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AreaBeamConfig {
    pub speed: Vec<WDist>,
    /// Ticks the head travels before the tail starts following
    pub duration: u32,
    pub damage_interval: u32,
    pub width: WDist,
    pub render_shape: BeamRenderShape,
    /// Overshoot past the target
    pub beyond_target_range: WDist,
    /// Shortest distance the head travels
    pub min_distance: WDist,
    /// Damage percentage by distance from the source
    pub falloff: FalloffCurve,
    pub track_target: bool,
    pub render_beam: bool,
    pub color: Color,
}

#[derive(Debug)]
pub struct AreaBeam {
    info: Arc<AreaBeamConfig>,
    args: ShotArgs,
    guided: GuidedTarget,
    weapon_range: i32,
    head: WPos,
    tail: WPos,
    target: WPos,
    length: i64,
    head_ticks: i64,
    tail_ticks: i64,
    head_travelling: bool,
    tail_travelling: bool,
    tracking: bool,
}

/// `pos` pushed `distance` further along `facing`
fn overshoot(pos: WPos, facing: WAngle, distance: i32) -> WPos {
    pos + WVec::from_yaw(facing, distance)
}

impl AreaBeam {
    pub fn new(info: Arc<AreaBeamConfig>, args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Self {
        let speed = pick_speed(&info.speed, ctx.shared_random);
        let samples = ctx.state.config().inaccuracy_samples;
        let mut target = args.passive_target + args.inaccuracy_offset(ctx.shared_random, samples);

        let facing = (target - args.source).yaw();
        let distance = (args.source - target).length();
        let (min, beyond) = (info.min_distance.0, info.beyond_target_range.0);
        let extra = if min > distance { (min - distance).max(beyond) } else { beyond };
        target = overshoot(target, facing, extra);

        Self {
            guided: args.guided_target,
            weapon_range: args.weapon_range(),
            head: args.source,
            tail: args.source,
            length: flight_length(args.source, target, speed),
            target,
            info,
            args,
            head_ticks: 0,
            tail_ticks: 0,
            head_travelling: true,
            tail_travelling: false,
            tracking: true,
        }
    }

    pub fn head(&self) -> WPos {
        self.head
    }

    pub fn tail(&self) -> WPos {
        self.tail
    }

    fn is_complete(&self) -> bool {
        !self.head_travelling && self.head_ticks >= self.length && !self.tail_travelling && self.tail_ticks >= self.length
    }

    fn stop_targeting(&mut self) {
        if self.tracking {
            trace!(weapon = %self.args.weapon.name, head_ticks = self.head_ticks, "Area beam tail released");
        }
        self.tracking = false;
        self.tail_travelling = true;
    }

    fn track_target(&mut self, ctx: &TickContext<'_>) {
        if !self.tracking {
            return;
        }
        let pos = self.guided.update(ctx.state());
        if self.guided.is_lost() {
            return;
        }
        let reach = self.weapon_range + self.info.beyond_target_range.0;
        if (pos - self.args.source).length() > reach {
            self.stop_targeting();
            return;
        }
        let facing = (pos - self.args.source).yaw();
        self.target = overshoot(pos, facing, self.info.beyond_target_range.0);
    }

    fn apply_damage(&self, ctx: &mut TickContext<'_>) {
        let state = ctx.state();
        let facing = (self.target - self.args.source).yaw();
        let age = self.head_ticks.clamp(0, u32::MAX as i64) as u32;
        for id in state.find_actors_on_line(self.tail, self.head, self.info.width) {
            let Some(actor) = state.actor(id) else {
                continue;
            };
            let distance = WDist((self.args.source - actor.position).length());
            let percent = self.info.falloff.evaluate(distance);
            let warhead_args = self
                .args
                .warhead_args(actor.position, facing)
                .with_damage_modifier(percent);
            impact_if_armed(ctx, &self.args, ImpactTarget::Actor(id), &warhead_args, age);
        }
    }
}

impl Effect for AreaBeam {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.info.track_target {
            self.track_target(ctx);
        }

        self.head_ticks += 1;
        if self.head_ticks >= self.length {
            self.head = self.target;
            self.head_travelling = false;
        } else if self.head_travelling {
            self.head = WPos::lerp(self.args.source, self.target, self.head_ticks, self.length);
        }

        let state = ctx.state();
        let firer = state.actor(self.args.source_actor).filter(|a| !a.is_dead());
        if self.tail_ticks <= 0 {
            if let Some(firer) = firer {
                self.args.source = firer.position;
                self.tail = firer.position;
            }
        }

        let reach = self.weapon_range as i64 + self.info.beyond_target_range.0 as i64;
        let out_of_range = ((self.args.passive_target - self.args.source).length() as i64) > reach;
        let burst_over = self.head_ticks >= self.info.duration as i64 && !self.tail_travelling;
        if burst_over || firer.is_none() || out_of_range {
            self.stop_targeting();
        }

        if self.tail_travelling {
            self.tail_ticks += 1;
            if self.tail_ticks >= self.length {
                self.tail = self.target;
                self.tail_travelling = false;
            } else {
                self.tail = WPos::lerp(self.args.source, self.target, self.tail_ticks, self.length);
            }
        }

        if self.args.projectile().blockable {
            let blocker = blocking_actor_between(
                state,
                self.args.owner,
                self.tail,
                self.head,
                self.info.width,
                Some(self.args.source_actor),
            );
            if let Some((_, hit)) = blocker {
                self.head = hit;
                self.target = hit;
                self.length = self.length.min(self.head_ticks);
            }
        }

        if self.head_ticks % self.info.damage_interval as i64 == 0 {
            self.apply_damage(ctx);
        }

        if self.is_complete() {
            ctx.remove_self();
        }
    }

    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        if self.is_complete() || !self.info.render_beam || (viewer.obscures(self.tail) && viewer.obscures(self.head)) {
            return Box::new(std::iter::empty());
        }
        Box::new(std::iter::once(Renderable::Beam {
            start: self.tail,
            end: self.head,
            width: self.info.width,
            shape: self.info.render_shape,
            color: self.info.color,
        }))
    }

    fn kind(&self) -> &'static str {
        "area-beam"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.head)
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
        [weapons.flamer]
        range = 4096
        [weapons.flamer.projectile]
        type = "AreaBeam"
        speed = [512]
        duration = 4
        damage_interval = 2
        width = 256
        falloff = [100, 50]
        range = [0, 4096]
        [[weapons.flamer.warheads]]
        type = "TargetDamage"
        damage = 100
    "#;

    fn world() -> World {
        let rules = WeaponRules::from_toml_str(RULES).unwrap();
        World::new(SimulationConfig::with_seed(5), Arc::new(rules)).unwrap()
    }

    #[test]
    fn test_area_beam_damages_on_interval_with_falloff() {
        let mut w = world();
        let firer = w.spawn_actor(ActorTemplate::new("flametank"), PlayerId(1), WPos::new(1024, 1024, 0));
        let victim = w.spawn_actor(
            ActorTemplate::new("infantry").with_health(1000),
            PlayerId(2),
            WPos::new(1024 + 2048, 1024, 0),
        );
        w.fire_weapon_named("flamer", firer, Target::Actor(victim));

        let mut hits = Vec::new();
        let mut ticks = 0;
        while w.effect_count() > 0 && ticks < 50 {
            ticks += 1;
            for event in w.tick() {
                if let SimEvent::ActorDamaged { actor, amount, .. } = event {
                    assert_eq!(actor, victim);
                    hits.push((ticks, amount));
                }
            }
        }
        // the head reaches the victim at tick 4 and the tail sets off in the
        // same tick, arriving at tick 7; halfway along the curve is 75 percent
        assert_eq!(hits, vec![(4, 75), (6, 75)]);
        assert_eq!(w.effect_count(), 0);
    }

    #[test]
    fn test_falloff_table_is_validated() {
        let def = AreaBeamDef {
            falloff: vec![50, 100],
            ..AreaBeamDef::default()
        };
        assert!(matches!(def.freeze(), Err(DefError::Falloff(_))));
    }
}
