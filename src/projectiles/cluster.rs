//! Cluster (warhead trail) projectiles
//!
//! One shot becomes a coordinator plus one [`Fragment`] per configured
//! offset. Fragments fly straight out along a pattern chosen by the
//! [`FireMode`] and detonate the parent weapon when their lifespan ends.
//! Every `explosion_interval` ticks the coordinator detonates the
//! referenced weapon at each fragment still in flight, leaving a trail of
//! explosions along the paths.
//!
//! The coordinator is inserted ahead of its fragments, so it always ticks
//! first. It does not hold handles to the fragments; their paths are fixed
//! at launch, and it recomputes where each one is from its own tick count.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{detonate, impact_if_armed, pick_speed, validate_speeds, ShotArgs};
use crate::effects::sprite::body_sprite;
use crate::effects::{
    Contrail, ContrailConfig, ContrailFader, Effect, LaunchContext, Renderable, SpriteConfig, TickContext, TrailConfig,
    TrailEmitter, ViewerContext,
};
use crate::geometry::{rotate_local, WAngle, WDist, WPos, WVec};
use crate::rules::{DefError, WeaponId};
use crate::warheads::{ImpactTarget, WarheadArgs};
use crate::world::{blocking_actor_between, WorldState};

/// How fragment paths are laid out relative to the firing direction.
/// Offsets are local: x forward, y left, z up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FireMode {
    /// Each fragment heads out along its offset's own bearing
    #[default]
    Spread,
    /// Parallel paths, each shifted by its offset
    Line,
    /// Paths from each offset converge on one point at full range
    Focus,
}

fn default_offsets() -> Vec<WVec> {
    vec![WVec::ZERO]
}

fn default_speed() -> Vec<WDist> {
    vec![WDist(128)]
}

/// Declared form of [`ClusterConfig`], naming its trail weapon
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterDef {
    pub weapon: String,
    pub offsets: Vec<WVec>,
    pub speed: Vec<WDist>,
    pub explosion_interval: u32,
    pub kill_at_target: bool,
    pub fire_mode: FireMode,
    pub sprite: Option<SpriteConfig>,
    pub trail: Option<TrailConfig>,
    pub contrail: Option<ContrailConfig>,
}

impl Default for ClusterDef {
    fn default() -> Self {
        Self {
            weapon: String::new(),
            offsets: default_offsets(),
            speed: default_speed(),
            explosion_interval: 8,
            kill_at_target: false,
            fire_mode: FireMode::Spread,
            sprite: None,
            trail: None,
            contrail: None,
        }
    }
}

impl ClusterDef {
    pub fn freeze(self, resolve: impl Fn(&str) -> Option<WeaponId>) -> Result<ClusterConfig, DefError> {
        if self.weapon.is_empty() {
            return Err(DefError::invalid("weapon", "a cluster needs a trail weapon"));
        }
        let weapon = resolve(&self.weapon).ok_or(DefError::UnknownWeapon(self.weapon))?;
        validate_speeds("speed", &self.speed)?;
        if self.offsets.is_empty() {
            return Err(DefError::invalid("offsets", "needs at least one fragment"));
        }
        if self.explosion_interval == 0 {
            return Err(DefError::invalid("explosion_interval", "must be at least 1"));
        }
        Ok(ClusterConfig {
            weapon,
            offsets: self.offsets,
            speed: self.speed,
            explosion_interval: self.explosion_interval,
            kill_at_target: self.kill_at_target,
            fire_mode: self.fire_mode,
            sprite: self.sprite,
            trail: self.trail,
            contrail: self.contrail,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Detonated along the fragment paths
    pub weapon: WeaponId,
    pub offsets: Vec<WVec>,
    pub speed: Vec<WDist>,
    pub explosion_interval: u32,
    /// Lifespan from the distance to the target instead of the weapon range
    pub kill_at_target: bool,
    pub fire_mode: FireMode,
    pub sprite: Option<SpriteConfig>,
    pub trail: Option<TrailConfig>,
    pub contrail: Option<ContrailConfig>,
}

/// A fragment's straight path, fixed at launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FragmentPath {
    source: WPos,
    target: WPos,
    /// Ticks to cover source..target
    travel: i64,
    /// Tick on which the fragment detonates
    lifespan: i64,
}

impl FragmentPath {
    /// Position after `ticks` moves
    fn position_at(&self, ticks: i64) -> WPos {
        WPos::lerp(self.source, self.target, ticks.min(self.travel), self.travel)
    }

    fn facing(&self) -> WAngle {
        (self.target - self.source).yaw()
    }
}

/// Source and target of one fragment for the given fire mode
fn fragment_endpoints(mode: FireMode, source: WPos, facing: WAngle, offset: WVec, range: i32) -> (WPos, WPos) {
    match mode {
        FireMode::Focus => (
            source + rotate_local(offset, facing),
            source + rotate_local(WVec::new(range, 0, 0), facing),
        ),
        FireMode::Line => (
            source + rotate_local(offset, facing),
            source + rotate_local(WVec::new(range + offset.x, offset.y, offset.z), facing),
        ),
        FireMode::Spread => {
            // source and target both turn by the offset's own yaw
            let heading = facing + offset.yaw();
            (
                source + rotate_local(offset, heading),
                source + rotate_local(WVec::new(range + offset.x, offset.y, offset.z), heading),
            )
        }
    }
}

/// Builds the coordinator followed by every fragment
pub fn launch(info: Arc<ClusterConfig>, args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Vec<Box<dyn Effect>> {
    let speed = pick_speed(&info.speed, ctx.shared_random).0.max(1) as i64;
    let range = args.weapon_range();
    let facing = args.facing;
    let estimated = (args.weapon.range.0 as i64 / speed).max(1);
    let lifespan = if info.kill_at_target {
        ((args.passive_target - args.source).length() as i64 / speed).max(1)
    } else {
        estimated
    };
    let min_delay = args.weapon.min_range.0 as i64 / speed;
    let samples = ctx.state.config().inaccuracy_samples;

    let mut paths = Vec::with_capacity(info.offsets.len());
    for offset in &info.offsets {
        let (source, mut target) = fragment_endpoints(info.fire_mode, args.source, facing, *offset, range);
        target += args.inaccuracy_offset(ctx.shared_random, samples);
        paths.push(FragmentPath {
            source,
            target,
            travel: estimated,
            lifespan,
        });
    }
    debug!(
        weapon = %args.weapon.name,
        fragments = paths.len(),
        lifespan,
        mode = ?info.fire_mode,
        "Cluster launched"
    );

    let mut effects: Vec<Box<dyn Effect>> = Vec::with_capacity(paths.len() + 1);
    effects.push(Box::new(ClusterCoordinator {
        info: info.clone(),
        args: args.clone(),
        paths: paths.clone(),
        lifespan,
        min_delay,
        ticks: 0,
    }));
    for path in paths {
        effects.push(Box::new(Fragment::new(info.clone(), &args, path)));
    }
    effects
}

/// Periodically detonates the trail weapon at every fragment still in flight
#[derive(Debug)]
pub struct ClusterCoordinator {
    info: Arc<ClusterConfig>,
    args: ShotArgs,
    paths: Vec<FragmentPath>,
    lifespan: i64,
    min_delay: i64,
    ticks: i64,
}

impl ClusterCoordinator {
    /// Whether the fragment on `path` has detonated after `ticks` moves
    fn fragment_done(&self, state: &WorldState, path: &FragmentPath, ticks: i64) -> bool {
        if ticks >= path.lifespan {
            return true;
        }
        let projectile = self.args.projectile();
        projectile.blockable
            && blocking_actor_between(
                state,
                self.args.owner,
                path.source,
                path.position_at(ticks),
                projectile.width,
                Some(self.args.source_actor),
            )
            .is_some()
    }

    fn trail_impacts(&self, ctx: &mut TickContext<'_>) {
        let state = ctx.state();
        let Some(weapon) = state.rules().get(self.info.weapon).cloned() else {
            warn!(weapon = %self.info.weapon, "Cluster trail weapon missing from rules");
            return;
        };
        let age = self.ticks.clamp(0, u32::MAX as i64) as u32;
        for path in &self.paths {
            if self.fragment_done(state, path, self.ticks) {
                continue;
            }
            let position = path.position_at(self.ticks);
            let warhead_args = WarheadArgs {
                weapon: weapon.clone(),
                source: path.source,
                source_actor: self.args.source_actor,
                owner: self.args.owner,
                impact_position: position,
                impact_facing: path.facing(),
                modifiers: self.args.modifiers.clone(),
            };
            impact_if_armed(ctx, &self.args, ImpactTarget::Position(position), &warhead_args, age);
        }
    }
}

impl Effect for ClusterCoordinator {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.ticks % self.info.explosion_interval as i64 == 0 && self.min_delay <= self.ticks {
            self.trail_impacts(ctx);
        }
        if self.ticks >= self.lifespan {
            ctx.remove_self();
        }
        self.ticks += 1;
    }

    fn render<'a>(&'a self, _viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        Box::new(std::iter::empty())
    }

    fn kind(&self) -> &'static str {
        "cluster"
    }
}

/// One sub-projectile of a cluster shot
#[derive(Debug)]
pub struct Fragment {
    info: Arc<ClusterConfig>,
    args: ShotArgs,
    path: FragmentPath,
    pos: WPos,
    ticks: i64,
    trail: Option<TrailEmitter>,
    contrail: Option<Contrail>,
    exploded: bool,
}

impl Fragment {
    fn new(info: Arc<ClusterConfig>, parent: &ShotArgs, path: FragmentPath) -> Self {
        let mut args = parent.clone();
        args.source = path.source;
        args.passive_target = path.target;
        args.guided_target = super::GuidedTarget::position(path.target);
        args.facing = path.facing();
        Self {
            trail: info.trail.clone().map(TrailEmitter::new),
            contrail: info.contrail.map(Contrail::new),
            info,
            args,
            pos: path.source,
            path,
            ticks: 0,
            exploded: false,
        }
    }

    pub fn source(&self) -> WPos {
        self.path.source
    }

    pub fn target(&self) -> WPos {
        self.path.target
    }

    fn explode(&mut self, ctx: &mut TickContext<'_>) {
        self.exploded = true;
        ctx.remove_self();
        if let Some(contrail) = self.contrail.take() {
            ctx.add_effect(ContrailFader::new(contrail));
        }
        let age = self.ticks.clamp(0, u32::MAX as i64) as u32;
        detonate(ctx, &self.args, ImpactTarget::Position(self.pos), self.pos, self.args.facing, age);
    }
}

impl Effect for Fragment {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        debug_assert!(!self.exploded, "exploded fragment ticked again");
        if self.exploded {
            return;
        }

        let last = self.pos;
        self.ticks += 1;
        self.pos = self.path.position_at(self.ticks);

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
            if let Some((_, hit)) = blocker {
                self.pos = hit;
                self.explode(ctx);
                return;
            }
        }

        if let Some(trail) = self.trail.as_mut() {
            trail.tick(ctx, self.pos, self.args.facing);
        }
        if let Some(contrail) = self.contrail.as_mut() {
            contrail.update(self.pos);
        }

        if self.ticks >= self.path.lifespan {
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
                body_sprite(sprite, sequence, self.pos, self.args.facing, self.ticks as u32)
            });
        let contrail = self.contrail.as_ref().and_then(|c| c.render(viewer));
        Box::new(body.into_iter().chain(contrail))
    }

    fn kind(&self) -> &'static str {
        "fragment"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.pos)
    }
}
