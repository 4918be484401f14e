//! Integer world geometry
//!
//! Gameplay positions, distances and angles are integers so that every
//! lockstep replica computes bit-identical values. 1024 world units make
//! one map cell and 1024 angle units make a full turn.

pub mod angle;
pub mod interp;
pub mod vector;

pub use angle::WAngle;
pub use interp::{closest_point_on_segment, distance_along, distance_to_segment, rotate_local, tick_facing};
pub use vector::{isqrt, WDist, WPos, WVec, CELL};
