//! World positions, offsets and distances in integer world units

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use super::angle::WAngle;

/// World units in one map cell
pub const CELL: i32 = 1024;

/// A length in world units
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Neg,
    derive_more::From,
)]
#[serde(transparent)]
pub struct WDist(pub i32);

impl WDist {
    pub const ZERO: WDist = WDist(0);

    pub fn from_cells(cells: i32) -> Self {
        WDist(cells * CELL)
    }

    pub fn length(self) -> i32 {
        self.0
    }
}

/// A point in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// An offset between two world points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WVec {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WPos {
    pub const ZERO: WPos = WPos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Map cell containing this position
    pub fn cell(self) -> (i32, i32) {
        (self.x.div_euclid(CELL), self.y.div_euclid(CELL))
    }

    /// Linear interpolation: `a + (b - a) * mul / div`
    pub fn lerp(a: WPos, b: WPos, mul: i64, div: i64) -> WPos {
        let div = div.max(1);
        let lerp = |a: i32, b: i32| (a as i64 + (b as i64 - a as i64) * mul / div) as i32;
        WPos::new(lerp(a.x, b.x), lerp(a.y, b.y), lerp(a.z, b.z))
    }

    /// Linear interpolation with an extra parabolic height of
    /// `|b - a| * tan(pitch) * t * (1 - t)` where `t = mul / div`.
    pub fn lerp_quadratic(a: WPos, b: WPos, pitch: WAngle, mul: i64, div: i64) -> WPos {
        let ret = WPos::lerp(a, b, mul, div);
        if pitch == WAngle::ZERO {
            return ret;
        }

        let div = div.max(1) as i128;
        let length = (b - a).length() as i128;
        let offset = length * pitch.tan() as i128 * mul as i128 * (div - mul as i128) / (1024 * div * div);
        WPos::new(ret.x, ret.y, ret.z + offset as i32)
    }

    pub fn with_z(self, z: i32) -> WPos {
        WPos::new(self.x, self.y, z)
    }

    /// Render-space position for consumers working in floats
    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl WVec {
    pub const ZERO: WVec = WVec { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal vector of `length` pointing along `yaw`
    pub fn from_yaw(yaw: WAngle, length: i32) -> WVec {
        WVec::new(
            (yaw.cos() as i64 * length as i64 / 1024) as i32,
            (yaw.sin() as i64 * length as i64 / 1024) as i32,
            0,
        )
    }

    pub fn length_squared(self) -> i64 {
        let (x, y, z) = (self.x as i64, self.y as i64, self.z as i64);
        x * x + y * y + z * z
    }

    pub fn length(self) -> i32 {
        isqrt(self.length_squared() as u64) as i32
    }

    pub fn horizontal_length_squared(self) -> i64 {
        let (x, y) = (self.x as i64, self.y as i64);
        x * x + y * y
    }

    pub fn horizontal_length(self) -> i32 {
        isqrt(self.horizontal_length_squared() as u64) as i32
    }

    /// Heading of the horizontal component
    pub fn yaw(self) -> WAngle {
        WAngle::arc_tan(self.y as i64, self.x as i64)
    }

    /// Rotates the horizontal component counter-clockwise by `yaw`
    pub fn rotate_yaw(self, yaw: WAngle) -> WVec {
        let (s, c) = (yaw.sin() as i64, yaw.cos() as i64);
        let (x, y) = (self.x as i64, self.y as i64);
        WVec::new(((x * c - y * s) / 1024) as i32, ((x * s + y * c) / 1024) as i32, self.z)
    }

    /// Scales to the requested length, keeping direction. Zero stays zero.
    pub fn with_length(self, length: i32) -> WVec {
        let current = self.length() as i64;
        if current == 0 {
            return WVec::ZERO;
        }
        let scale = |v: i32| (v as i64 * length as i64 / current) as i32;
        WVec::new(scale(self.x), scale(self.y), scale(self.z))
    }

    pub fn dot(self, other: WVec) -> i64 {
        self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64 + self.z as i64 * other.z as i64
    }
}

/// Integer square root, rounded down
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + n % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

impl Sub for WPos {
    type Output = WVec;
    fn sub(self, rhs: WPos) -> WVec {
        WVec::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add<WVec> for WPos {
    type Output = WPos;
    fn add(self, rhs: WVec) -> WPos {
        WPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<WVec> for WPos {
    type Output = WPos;
    fn sub(self, rhs: WVec) -> WPos {
        WPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AddAssign<WVec> for WPos {
    fn add_assign(&mut self, rhs: WVec) {
        *self = *self + rhs;
    }
}

impl SubAssign<WVec> for WPos {
    fn sub_assign(&mut self, rhs: WVec) {
        *self = *self - rhs;
    }
}

impl Add for WVec {
    type Output = WVec;
    fn add(self, rhs: WVec) -> WVec {
        WVec::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for WVec {
    type Output = WVec;
    fn sub(self, rhs: WVec) -> WVec {
        WVec::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AddAssign for WVec {
    fn add_assign(&mut self, rhs: WVec) {
        *self = *self + rhs;
    }
}

impl Neg for WVec {
    type Output = WVec;
    fn neg(self) -> WVec {
        WVec::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<i32> for WVec {
    type Output = WVec;
    fn mul(self, rhs: i32) -> WVec {
        WVec::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<i32> for WVec {
    type Output = WVec;
    fn div(self, rhs: i32) -> WVec {
        WVec::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(2), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(1 << 62), 1 << 31);
    }

    #[test]
    fn test_length_of_pythagorean_triple() {
        assert_eq!(WVec::new(3000, 4000, 0).length(), 5000);
        assert_eq!(WVec::new(3, 4, 12).length(), 13);
    }

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let a = WPos::new(-100, 77, 0);
        let b = WPos::new(9001, -333, 512);
        assert_eq!(WPos::lerp(a, b, 0, 7), a);
        assert_eq!(WPos::lerp(a, b, 7, 7), b);
    }

    #[test]
    fn test_lerp_quadratic_peaks_midway() {
        let a = WPos::new(0, 0, 0);
        let b = WPos::new(4096, 0, 0);
        let pitch = WAngle::new(128);
        let quarter = WPos::lerp_quadratic(a, b, pitch, 1, 4);
        let mid = WPos::lerp_quadratic(a, b, pitch, 2, 4);
        let end = WPos::lerp_quadratic(a, b, pitch, 4, 4);
        assert!(mid.z > quarter.z);
        assert!(quarter.z > 0);
        assert_eq!(end, b);
    }

    #[test]
    fn test_rotate_and_yaw_agree() {
        let v = WVec::new(1024, 0, 0).rotate_yaw(WAngle::new(256));
        assert_eq!(v, WVec::new(0, 1024, 0));
        assert_eq!(WVec::from_yaw(WAngle::new(512), 2048), WVec::new(-2048, 0, 0));
        assert_eq!(WVec::new(0, -50, 0).yaw().units(), 768);
    }

    #[test]
    fn test_cell_of_negative_position() {
        assert_eq!(WPos::new(-1, 1023, 0).cell(), (-1, 0));
    }
}
