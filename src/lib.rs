//! Ordnance - deterministic projectile and warhead simulation
//!
//! Weapons fire projectiles; projectiles fly for some ticks and then hand a
//! terminal point to the weapon's warheads, which queue damage, captures,
//! spawns and feedback for the end of the tick. All gameplay math is
//! integer and all gameplay randomness comes from one synchronized stream,
//! so replicas fed the same orders stay in lockstep.

pub mod core;
pub mod effects;
pub mod geometry;
pub mod projectiles;
pub mod rules;
pub mod scenario;
pub mod spatial;
pub mod warheads;
pub mod world;

pub use crate::core::config::SimulationConfig;
pub use crate::core::error::{OrdnanceError, Result};
pub use crate::projectiles::{ShotArgs, Target};
pub use crate::rules::{WeaponId, WeaponRules};
pub use crate::world::{ActorTemplate, SimEvent, World};
