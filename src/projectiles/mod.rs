//! Projectiles: the in-flight part of a shot
//!
//! Each weapon's projectile settings select one motion model at load time.
//! [`launch`] turns a [`ShotArgs`] into the effect(s) for that model. Every
//! model resolves to a terminal point and hands it to the weapon's
//! warheads, subject to the arming delay.

pub mod area_beam;
pub mod args;
pub mod beam;
pub mod bullet;
pub mod cluster;
pub mod missile;

use tracing::debug;

use crate::core::random::SharedRandom;
use crate::effects::{Effect, LaunchContext, TickContext};
use crate::geometry::{WAngle, WDist, WPos};
use crate::rules::{DefError, MotionModel};
use crate::warheads::{impact_weapon, ImpactTarget, WarheadArgs};

pub use area_beam::{AreaBeam, AreaBeamConfig, AreaBeamDef};
pub use args::{GuidedTarget, ShotArgs, Target};
pub use beam::{Beam, BeamConfig, BeamShape, HelixConfig};
pub use bullet::{Bullet, BulletConfig};
pub use cluster::{ClusterConfig, ClusterCoordinator, ClusterDef, FireMode, Fragment};
pub use missile::{Missile, MissileConfig};

/// Builds the effects for one shot. Random draws happen here, in call order.
pub fn launch(args: ShotArgs, ctx: &mut LaunchContext<'_>) -> Vec<Box<dyn Effect>> {
    let model = args.weapon.projectile.model.clone();
    debug!(weapon = %args.weapon.name, model = model.name(), source = ?args.source, "Launching");
    match model {
        MotionModel::Bullet(info) => vec![Box::new(Bullet::new(info, args, ctx))],
        MotionModel::Missile(info) => vec![Box::new(Missile::new(info, args, ctx))],
        MotionModel::Beam(info) => vec![Box::new(Beam::new(info, args, ctx))],
        MotionModel::AreaBeam(info) => vec![Box::new(AreaBeam::new(info, args, ctx))],
        MotionModel::Cluster(info) => cluster::launch(info, args, ctx),
    }
}

/// Hands an arrived projectile to its warheads. Impacts before the arming
/// delay has elapsed do nothing.
pub(crate) fn detonate(
    ctx: &mut TickContext<'_>,
    args: &ShotArgs,
    target: ImpactTarget,
    position: WPos,
    facing: WAngle,
    age: u32,
) {
    impact_if_armed(ctx, args, target, &args.warhead_args(position, facing), age);
}

/// As [`detonate`], with prepared warhead args
pub(crate) fn impact_if_armed(
    ctx: &mut TickContext<'_>,
    args: &ShotArgs,
    target: ImpactTarget,
    warhead_args: &WarheadArgs,
    age: u32,
) {
    let arming_delay = args.projectile().arming_delay;
    if age < arming_delay {
        debug!(weapon = %args.weapon.name, age, arming_delay, "Impact before arming, no effect");
        return;
    }
    debug!(weapon = %args.weapon.name, position = ?warhead_args.impact_position, age, "Detonating");
    impact_weapon(ctx, &target, warhead_args);
}

/// Checks a speed list: one value, or a `[min, max]` pair, all positive
pub(crate) fn validate_speeds(field: &'static str, speeds: &[WDist]) -> Result<(), DefError> {
    match speeds {
        [] => Err(DefError::invalid(field, "needs one value or a [min, max] pair")),
        s if s.len() > 2 => Err(DefError::invalid(field, "needs one value or a [min, max] pair")),
        s if s.iter().any(|v| v.0 <= 0) => Err(DefError::invalid(field, "must be positive")),
        [min, max] if max < min => Err(DefError::invalid(field, "max is below min")),
        _ => Ok(()),
    }
}

/// The single value, or a synchronized draw from a `[min, max)` pair
pub(crate) fn pick_speed(speeds: &[WDist], random: &mut SharedRandom) -> WDist {
    match speeds {
        [min, max] => WDist(random.next_range(min.0, max.0)),
        [speed, ..] => *speed,
        [] => WDist(1),
    }
}

pub(crate) fn pick_angle(angles: &[WAngle], random: &mut SharedRandom) -> WAngle {
    match angles {
        [min, max] => WAngle::new(random.next_range(min.units(), max.units())),
        [angle, ..] => *angle,
        [] => WAngle::ZERO,
    }
}

/// Ticks needed to cover `source..target` at `speed`, rounded up, at least one
pub(crate) fn flight_length(source: WPos, target: WPos, speed: WDist) -> i64 {
    let distance = (target - source).length() as i64;
    let speed = speed.0.max(1) as i64;
    ((distance + speed - 1) / speed).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_length_rounds_up() {
        assert_eq!(flight_length(WPos::ZERO, WPos::new(1000, 0, 0), WDist(100)), 10);
        assert_eq!(flight_length(WPos::ZERO, WPos::new(1001, 0, 0), WDist(100)), 11);
        assert_eq!(flight_length(WPos::ZERO, WPos::ZERO, WDist(100)), 1);
    }

    #[test]
    fn test_speed_validation() {
        assert!(validate_speeds("speed", &[WDist(10)]).is_ok());
        assert!(validate_speeds("speed", &[WDist(10), WDist(20)]).is_ok());
        assert!(validate_speeds("speed", &[]).is_err());
        assert!(validate_speeds("speed", &[WDist(-1)]).is_err());
        assert!(validate_speeds("speed", &[WDist(20), WDist(10)]).is_err());
    }

    #[test]
    fn test_pick_speed_single_value_draws_nothing() {
        let mut random = SharedRandom::new(1);
        assert_eq!(pick_speed(&[WDist(50)], &mut random), WDist(50));
        assert_eq!(random.draws(), 0);
        let s = pick_speed(&[WDist(50), WDist(60)], &mut random);
        assert!(s.0 >= 50 && s.0 < 60);
        assert_eq!(random.draws(), 1);
    }
}
