//! Steering and segment helpers shared by the motion models

use super::angle::WAngle;
use super::vector::{WPos, WVec};

/// Turns `facing` towards `desired` by at most `rate`, taking the short way round.
pub fn tick_facing(facing: WAngle, desired: WAngle, rate: WAngle) -> WAngle {
    let left_turn = (facing - desired).units();
    let right_turn = (desired - facing).units();
    if left_turn.min(right_turn) <= rate.units() {
        desired
    } else if right_turn < left_turn {
        facing + rate
    } else {
        facing - rate
    }
}

/// Closest point to `p` on the segment `a..b`
pub fn closest_point_on_segment(a: WPos, b: WPos, p: WPos) -> WPos {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0 {
        return a;
    }
    let t = (p - a).dot(ab).clamp(0, len_sq);
    WPos::lerp(a, b, t, len_sq)
}

/// Distance from `p` to the segment `a..b`
pub fn distance_to_segment(a: WPos, b: WPos, p: WPos) -> i32 {
    (p - closest_point_on_segment(a, b, p)).length()
}

/// Offset of `p` along the `a..b` axis, in world units from `a`
pub fn distance_along(a: WPos, b: WPos, p: WPos) -> i64 {
    let ab = b - a;
    let len = ab.length() as i64;
    if len == 0 {
        return 0;
    }
    (p - a).dot(ab) / len
}

/// Local offset (x forward, y left) expressed in world space for a heading
pub fn rotate_local(offset: WVec, facing: WAngle) -> WVec {
    offset.rotate_yaw(facing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_facing_turns_short_way() {
        let f = tick_facing(WAngle::new(10), WAngle::new(1000), WAngle::new(8));
        assert_eq!(f.units(), 2);
        let f = tick_facing(WAngle::new(1000), WAngle::new(10), WAngle::new(8));
        assert_eq!(f.units(), 1008);
    }

    #[test]
    fn test_tick_facing_snaps_within_rate() {
        let f = tick_facing(WAngle::new(100), WAngle::new(104), WAngle::new(8));
        assert_eq!(f.units(), 104);
    }

    #[test]
    fn test_closest_point_clamps_to_ends() {
        let a = WPos::new(0, 0, 0);
        let b = WPos::new(1000, 0, 0);
        assert_eq!(closest_point_on_segment(a, b, WPos::new(-50, 30, 0)), a);
        assert_eq!(closest_point_on_segment(a, b, WPos::new(2000, 30, 0)), b);
        assert_eq!(closest_point_on_segment(a, b, WPos::new(400, 300, 0)), WPos::new(400, 0, 0));
        assert_eq!(distance_to_segment(a, b, WPos::new(400, 300, 0)), 300);
    }

    #[test]
    fn test_distance_along_axis() {
        let a = WPos::new(0, 0, 0);
        let b = WPos::new(0, 2048, 0);
        assert_eq!(distance_along(a, b, WPos::new(99, 512, 0)), 512);
    }
}
