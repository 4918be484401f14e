//! Weapon rules: declared in TOML, frozen at load time

pub mod loader;
pub mod schema;
pub mod weapon;

pub use loader::{RulesError, WeaponRules};
pub use schema::{DefError, RulesFile, WeaponDef};
pub use weapon::{InaccuracyType, MotionModel, ProjectileConfig, WeaponConfig, WeaponId};
