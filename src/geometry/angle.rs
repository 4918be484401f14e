//! Integer angles
//!
//! A full turn is 1024 units. Angle 0 points along +x and angles grow
//! towards +y. Sine and cosine are scaled by 1024 and come from a quarter
//! wave table, so every replica gets identical values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::sync::OnceLock;

/// Units in a full turn
pub const FULL_TURN: i32 = 1024;
const QUARTER_TURN: i32 = FULL_TURN / 4;

/// Angle in 1/1024ths of a full turn, always normalized to `0..1024`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct WAngle(i32);

impl WAngle {
    pub const ZERO: WAngle = WAngle(0);

    pub fn new(units: i32) -> Self {
        Self(units.rem_euclid(FULL_TURN))
    }

    pub fn from_degrees(degrees: i32) -> Self {
        Self::new(degrees * FULL_TURN / 360)
    }

    /// Raw units in `0..1024`
    pub fn units(self) -> i32 {
        self.0
    }

    /// Signed units in `-512..512`, useful for turn direction
    pub fn signed_units(self) -> i32 {
        if self.0 > FULL_TURN / 2 {
            self.0 - FULL_TURN
        } else {
            self.0
        }
    }

    /// Sine scaled by 1024
    pub fn sin(self) -> i32 {
        let table = sine_table();
        let a = self.0;
        if a <= QUARTER_TURN {
            table[a as usize]
        } else if a <= 2 * QUARTER_TURN {
            table[(2 * QUARTER_TURN - a) as usize]
        } else if a <= 3 * QUARTER_TURN {
            -table[(a - 2 * QUARTER_TURN) as usize]
        } else {
            -table[(FULL_TURN - a) as usize]
        }
    }

    /// Cosine scaled by 1024
    pub fn cos(self) -> i32 {
        (self + WAngle(QUARTER_TURN)).sin()
    }

    /// Tangent scaled by 1024, saturating near the poles
    pub fn tan(self) -> i32 {
        let s = self.sin() as i64;
        let c = self.cos() as i64;
        if c == 0 {
            return if s >= 0 { i32::MAX } else { -i32::MAX };
        }
        (s * 1024 / c).clamp(-(i32::MAX as i64), i32::MAX as i64) as i32
    }

    /// Angle of the vector `(x, y)`. Returns zero for the null vector.
    pub fn arc_tan(y: i64, x: i64) -> WAngle {
        if x == 0 && y == 0 {
            return WAngle::ZERO;
        }

        let (ax, ay) = (x.abs(), y.abs());

        // y*cos(a) - x*sin(a) falls monotonically over the first quadrant,
        // so the crossing can be found by bisection.
        let table = sine_table();
        let residual = |a: i32| {
            let s = table[a as usize] as i128;
            let c = table[(QUARTER_TURN - a) as usize] as i128;
            ay as i128 * c - ax as i128 * s
        };

        let (mut lo, mut hi) = (0, QUARTER_TURN);
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if residual(mid) > 0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let a = if residual(lo).abs() <= residual(hi).abs() { lo } else { hi };

        match (x >= 0, y >= 0) {
            (true, true) => WAngle::new(a),
            (false, true) => WAngle::new(2 * QUARTER_TURN - a),
            (false, false) => WAngle::new(2 * QUARTER_TURN + a),
            (true, false) => WAngle::new(FULL_TURN - a),
        }
    }

    /// Shortest unsigned distance between two angles, in `0..=512`
    pub fn difference(self, other: WAngle) -> i32 {
        let d = (self - other).0;
        d.min(FULL_TURN - d)
    }
}

impl From<i32> for WAngle {
    fn from(units: i32) -> Self {
        WAngle::new(units)
    }
}

impl From<WAngle> for i32 {
    fn from(angle: WAngle) -> Self {
        angle.0
    }
}

impl Add for WAngle {
    type Output = WAngle;
    fn add(self, rhs: WAngle) -> WAngle {
        WAngle::new(self.0 + rhs.0)
    }
}

impl Sub for WAngle {
    type Output = WAngle;
    fn sub(self, rhs: WAngle) -> WAngle {
        WAngle::new(self.0 - rhs.0)
    }
}

impl Neg for WAngle {
    type Output = WAngle;
    fn neg(self) -> WAngle {
        WAngle::new(-self.0)
    }
}

impl fmt::Debug for WAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WAngle({})", self.0)
    }
}

/// Quarter wave sine table, 257 entries covering `0..=256` inclusive.
///
/// Built from a Taylor series using only IEEE add, multiply, divide and
/// round, which are exact-rounded on every platform.
fn sine_table() -> &'static [i32; 257] {
    static TABLE: OnceLock<[i32; 257]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0; 257];
        for (i, entry) in table.iter_mut().enumerate() {
            let x = i as f64 * std::f64::consts::PI / 512.0;
            *entry = (taylor_sin(x) * 1024.0).round() as i32;
        }
        table
    })
}

fn taylor_sin(x: f64) -> f64 {
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    for n in 1..14 {
        let k = (2 * n) as f64;
        term *= -x2 / (k * (k + 1.0));
        sum += term;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_values() {
        assert_eq!(WAngle::new(0).sin(), 0);
        assert_eq!(WAngle::new(256).sin(), 1024);
        assert_eq!(WAngle::new(512).sin(), 0);
        assert_eq!(WAngle::new(768).sin(), -1024);
        assert_eq!(WAngle::new(0).cos(), 1024);
        assert_eq!(WAngle::new(512).cos(), -1024);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(WAngle::new(-1).units(), 1023);
        assert_eq!(WAngle::new(2048 + 5).units(), 5);
        assert_eq!((WAngle::new(1000) + WAngle::new(100)).units(), 76);
        assert_eq!(WAngle::new(1000).signed_units(), -24);
    }

    #[test]
    fn test_arc_tan_quadrants() {
        assert_eq!(WAngle::arc_tan(0, 10).units(), 0);
        assert_eq!(WAngle::arc_tan(10, 0).units(), 256);
        assert_eq!(WAngle::arc_tan(0, -10).units(), 512);
        assert_eq!(WAngle::arc_tan(-10, 0).units(), 768);
        assert_eq!(WAngle::arc_tan(100, 100).units(), 128);
        assert_eq!(WAngle::arc_tan(-100, -100).units(), 640);
    }

    #[test]
    fn test_arc_tan_inverts_sin_cos() {
        for units in (0..1024).step_by(7) {
            let a = WAngle::new(units);
            let back = WAngle::arc_tan(a.sin() as i64 * 100, a.cos() as i64 * 100);
            assert!(a.difference(back) <= 1, "{units} -> {}", back.units());
        }
    }

    #[test]
    fn test_difference_wraps() {
        assert_eq!(WAngle::new(10).difference(WAngle::new(1014)), 20);
        assert_eq!(WAngle::new(0).difference(WAngle::new(512)), 512);
    }
}
