//! Instant beams: lasers, tesla zaps and railguns
//!
//! A beam has no travel phase. Its end point is fixed at construction
//! (inaccuracy and blockers included) and the warheads are applied on the
//! first tick. The remaining duration only fades the visuals out.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use super::{detonate, ShotArgs};
use crate::core::random::CosmeticRandom;
use crate::effects::{
    BeamRenderShape, Color, Effect, LaunchContext, Renderable, SpriteConfig, SpriteEffect, TickContext, ViewerContext,
};
use crate::geometry::{isqrt, WAngle, WDist, WPos, WVec};
use crate::rules::DefError;
use crate::warheads::ImpactTarget;
use crate::world::clamp_to_blocker;

/// How a beam is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamShape {
    /// Straight laser
    #[default]
    Line,
    /// Jagged tesla-style zap
    Arc,
    /// Straight core with a coil wound around it
    Helix,
    /// Nothing drawn, removed after the impact
    Invisible,
}

fn default_beam_color() -> Color {
    Color::rgba(255, 255, 255, 128)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelixConfig {
    pub thickness: WDist,
    pub radius: WDist,
    /// Length of one full turn along the beam
    pub pitch: WDist,
    pub radius_delta_per_tick: i32,
    pub alpha_delta_per_tick: i32,
    /// Spin per tick
    pub angle_delta_per_tick: WAngle,
    /// Points per turn
    pub quantization: u32,
    pub color: Color,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            thickness: WDist(32),
            radius: WDist(64),
            pitch: WDist(512),
            radius_delta_per_tick: 8,
            alpha_delta_per_tick: -8,
            angle_delta_per_tick: WAngle::new(16),
            quantization: 16,
            color: default_beam_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    pub shape: BeamShape,
    /// Ticks the beam stays visible
    pub duration: u32,
    pub beam_width: WDist,
    pub render_shape: BeamRenderShape,
    pub color: Color,
    pub alpha_delta_per_tick: i32,
    /// Segments in an `Arc` zap
    pub arc_segments: u32,
    /// Largest sideways displacement of an `Arc` zap point
    pub arc_jitter: WDist,
    pub helix: HelixConfig,
    /// Impact every actor touched by the beam instead of the end point
    pub damage_actors_in_line: bool,
    pub hit_sprite: Option<SpriteConfig>,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            shape: BeamShape::Line,
            duration: 15,
            beam_width: WDist(86),
            render_shape: BeamRenderShape::Cylindrical,
            color: default_beam_color(),
            alpha_delta_per_tick: -8,
            arc_segments: 8,
            arc_jitter: WDist(128),
            helix: HelixConfig::default(),
            damage_actors_in_line: false,
            hit_sprite: None,
        }
    }
}

impl BeamConfig {
    pub fn validate(&self) -> Result<(), DefError> {
        if self.duration == 0 {
            return Err(DefError::invalid("duration", "must be at least one tick"));
        }
        if self.beam_width < WDist::ZERO {
            return Err(DefError::invalid("beam_width", "must not be negative"));
        }
        if self.arc_segments == 0 {
            return Err(DefError::invalid("arc_segments", "must be at least 1"));
        }
        if self.helix.pitch <= WDist::ZERO {
            return Err(DefError::invalid("helix.pitch", "must be positive"));
        }
        if self.helix.quantization == 0 {
            return Err(DefError::invalid("helix.quantization", "must be at least 1"));
        }
        Ok(())
    }
}

/// Scales `(x, y, z)` to length 1024, or zero
fn unit_1024(x: i64, y: i64, z: i64) -> WVec {
    let len = isqrt((x * x + y * y + z * z) as u64) as i64;
    if len == 0 {
        return WVec::ZERO;
    }
    WVec::new((x * 1024 / len) as i32, (y * 1024 / len) as i32, (z * 1024 / len) as i32)
}

/// Frame of the coil around a helix beam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HelixGeometry {
    forward_step: WVec,
    left: WVec,
    up: WVec,
    cycles: i32,
    /// Drawn core, ending where the coil ends
    core: WVec,
}

impl HelixGeometry {
    fn new(source: WPos, target: WPos, helix: &HelixConfig) -> Self {
        let to_target = target - source;
        let length = to_target.length() as i64;
        let quantization = helix.quantization as i64;
        let pitch = helix.pitch.0 as i64;
        if length == 0 {
            return Self {
                forward_step: WVec::ZERO,
                left: WVec::ZERO,
                up: WVec::ZERO,
                cycles: 0,
                core: WVec::ZERO,
            };
        }

        let step = |v: i32| (pitch * v as i64 / (quantization * length)) as i32;
        let forward_step = WVec::new(step(to_target.x), step(to_target.y), step(to_target.z));
        let (fx, fy, fz) = (forward_step.x as i64, forward_step.y as i64, forward_step.z as i64);
        let left = unit_1024(fy, -fx, 0);
        let up = unit_1024(-fx * fz, -fz * fy, fx * fx + fy * fy);
        let cycles = ((length + pitch - 1) / pitch) as i32;
        let core = forward_step * (helix.quantization as i32 * cycles);

        Self {
            forward_step,
            left,
            up,
            cycles,
            core,
        }
    }

    fn points(&self, source: WPos, helix: &HelixConfig, ticks: u32) -> Vec<WPos> {
        let quantization = helix.quantization as i32;
        let angle_step = 1024 / quantization.max(1);
        let radius = (helix.radius.0 + helix.radius_delta_per_tick * ticks as i32) as i64;
        let spin = helix.angle_delta_per_tick.units() * ticks as i32;
        (0..=quantization * self.cycles)
            .map(|i| {
                let angle = WAngle::new(i * angle_step + spin);
                let (s, c) = (angle.sin() as i64, angle.cos() as i64);
                let offset = |l: i32, u: i32| ((l as i64 * s + u as i64 * c) * radius / (1024 * 1024)) as i32;
                let around = WVec::new(
                    offset(self.left.x, self.up.x),
                    offset(self.left.y, self.up.y),
                    offset(self.left.z, self.up.z),
                );
                source + self.forward_step * i + around
            })
            .collect()
    }
}

/// Jagged path for an `Arc` zap. Only visual, so drawn from the cosmetic stream.
fn zap_points(source: WPos, target: WPos, segments: u32, jitter: WDist, random: &mut CosmeticRandom) -> Vec<WPos> {
    let segments = segments.max(1) as i64;
    let j = jitter.0.max(0);
    (0..=segments)
        .map(|i| {
            let p = WPos::lerp(source, target, i, segments);
            if i == 0 || i == segments {
                p
            } else {
                p + WVec::new(random.next_range(-j, j + 1), random.next_range(-j, j + 1), 0)
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct Beam {
    info: Arc<BeamConfig>,
    args: ShotArgs,
    target: WPos,
    helix: Option<HelixGeometry>,
    zap: Vec<WPos>,
    ticks: u32,
}

impl Beam {
    pub fn new(info: Arc<BeamConfig>, args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Self {
        let samples = ctx.state.config().inaccuracy_samples;
        let mut target = args.passive_target + args.inaccuracy_offset(ctx.shared_random, samples);
        if args.projectile().blockable {
            target = clamp_to_blocker(
                ctx.state,
                args.owner,
                args.source,
                target,
                info.beam_width,
                Some(args.source_actor),
            );
        }

        let helix = (info.shape == BeamShape::Helix).then(|| HelixGeometry::new(args.source, target, &info.helix));
        let zap = if info.shape == BeamShape::Arc {
            zap_points(args.source, target, info.arc_segments, info.arc_jitter, ctx.cosmetic_random)
        } else {
            Vec::new()
        };

        Self {
            info,
            args,
            target,
            helix,
            zap,
            ticks: 0,
        }
    }

    /// End point after inaccuracy and blocking
    pub fn end_point(&self) -> WPos {
        self.target
    }

    fn impact(&self, ctx: &mut TickContext<'_>) {
        let facing = self.args.facing;
        if self.info.damage_actors_in_line {
            let state = ctx.state();
            let victims = state.find_actors_on_line(self.args.source, self.target, self.info.beam_width);
            trace!(weapon = %self.args.weapon.name, victims = victims.len(), "Beam hits actors in line");
            for id in victims {
                let Some(actor) = state.actor(id) else {
                    continue;
                };
                detonate(ctx, &self.args, ImpactTarget::Actor(id), actor.position, facing, self.ticks);
            }
        } else {
            detonate(ctx, &self.args, ImpactTarget::Position(self.target), self.target, facing, self.ticks);
        }

        if let Some(sprite) = &self.info.hit_sprite {
            let effect = SpriteEffect::new(sprite, self.target, facing, ctx.cosmetic_random());
            ctx.add_effect(effect);
        }
    }
}

impl Effect for Beam {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.ticks += 1;
        if self.ticks == 1 {
            self.impact(ctx);
        }
        if self.info.shape == BeamShape::Invisible || self.ticks >= self.info.duration {
            ctx.remove_self();
        }
    }

    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        let hidden = self.info.shape == BeamShape::Invisible
            || self.ticks >= self.info.duration
            || (viewer.obscures(self.args.source) && viewer.obscures(self.target));
        if hidden {
            return Box::new(std::iter::empty());
        }

        let info = &self.info;
        let color = info.color.shift_alpha(info.alpha_delta_per_tick * self.ticks as i32);
        let source = self.args.source;
        let beam = |end: WPos| Renderable::Beam {
            start: source,
            end,
            width: info.beam_width,
            shape: info.render_shape,
            color,
        };

        match (info.shape, &self.helix) {
            (BeamShape::Arc, _) => Box::new(std::iter::once(Renderable::Polyline {
                points: self.zap.clone(),
                width: info.beam_width,
                start_color: color,
                end_color: color,
            })),
            (BeamShape::Helix, Some(helix)) => {
                let helix_color = info
                    .helix
                    .color
                    .shift_alpha(info.helix.alpha_delta_per_tick * self.ticks as i32);
                let coil = Renderable::Polyline {
                    points: helix.points(source, &info.helix, self.ticks),
                    width: info.helix.thickness,
                    start_color: helix_color,
                    end_color: helix_color,
                };
                Box::new([coil, beam(source + helix.core)].into_iter())
            }
            _ => Box::new(std::iter::once(beam(self.target))),
        }
    }

    fn kind(&self) -> &'static str {
        "beam"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helix_vectors_are_unit_and_perpendicular() {
        let helix = HelixConfig::default();
        let g = HelixGeometry::new(WPos::new(0, 0, 0), WPos::new(2048, 0, 0), &helix);
        assert_eq!(g.forward_step, WVec::new(32, 0, 0));
        assert_eq!(g.left, WVec::new(0, -1024, 0));
        assert_eq!(g.up, WVec::new(0, 0, 1024));
        assert_eq!(g.cycles, 4);
        assert_eq!(g.core, WVec::new(2048, 0, 0));
    }

    #[test]
    fn test_helix_cycles_round_up() {
        let helix = HelixConfig::default();
        let g = HelixGeometry::new(WPos::new(0, 0, 0), WPos::new(600, 0, 0), &helix);
        assert_eq!(g.cycles, 2);
        let points = g.points(WPos::new(0, 0, 0), &helix, 0);
        assert_eq!(points.len(), 33);
        // angle zero puts the first point straight up at the base radius
        assert_eq!(points[0], WPos::new(0, 0, 64));
    }

    #[test]
    fn test_zap_endpoints_are_exact() {
        let mut random = CosmeticRandom::new(9);
        let points = zap_points(WPos::new(0, 0, 0), WPos::new(1000, 0, 0), 4, WDist(50), &mut random);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], WPos::new(0, 0, 0));
        assert_eq!(points[4], WPos::new(1000, 0, 0));
        assert!(points[2].y.abs() <= 50);
    }

    #[test]
    fn test_degenerate_beam_has_no_coil() {
        let helix = HelixConfig::default();
        let g = HelixGeometry::new(WPos::new(5, 5, 0), WPos::new(5, 5, 0), &helix);
        assert_eq!(g.cycles, 0);
        assert_eq!(g.points(WPos::new(5, 5, 0), &helix, 3).len(), 1);
    }

    #[test]
    fn test_validation() {
        assert!(BeamConfig::default().validate().is_ok());
        let bad = BeamConfig {
            duration: 0,
            ..BeamConfig::default()
        };
        assert!(matches!(bad.validate(), Err(DefError::Invalid { field: "duration", .. })));
    }
}
