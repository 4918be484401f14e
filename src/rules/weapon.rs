//! Frozen weapon configuration
//!
//! Built once by the loader and shared behind `Arc` by every shot. Nothing
//! here is mutated after load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::types::{target_types_allowed, TargetTypes};
use crate::geometry::WDist;
use crate::projectiles::{AreaBeamConfig, BeamConfig, BulletConfig, ClusterConfig, MissileConfig};
use crate::warheads::Warhead;

/// Index of a weapon inside [`super::WeaponRules`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeaponId(pub u32);

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weapon#{}", self.0)
    }
}

/// How the configured inaccuracy scales with shot distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InaccuracyType {
    /// Full inaccuracy at maximum weapon range, proportionally less closer in
    #[default]
    Maximum,
    /// Inaccuracy grows by the configured amount per cell travelled
    PerCellIncrement,
    /// Fixed regardless of distance
    Absolute,
}

/// The motion model a weapon's projectile uses
#[derive(Debug, Clone)]
pub enum MotionModel {
    Bullet(Arc<BulletConfig>),
    Missile(Arc<MissileConfig>),
    Beam(Arc<BeamConfig>),
    AreaBeam(Arc<AreaBeamConfig>),
    Cluster(Arc<ClusterConfig>),
}

impl MotionModel {
    pub fn name(&self) -> &'static str {
        match self {
            MotionModel::Bullet(_) => "bullet",
            MotionModel::Missile(_) => "missile",
            MotionModel::Beam(_) => "beam",
            MotionModel::AreaBeam(_) => "area-beam",
            MotionModel::Cluster(_) => "cluster",
        }
    }
}

/// Settings shared by every motion model
#[derive(Debug, Clone)]
pub struct ProjectileConfig {
    pub inaccuracy: WDist,
    pub inaccuracy_type: InaccuracyType,
    /// Impacts before this many ticks of flight do nothing
    pub arming_delay: u32,
    pub blockable: bool,
    /// Thickness used for blocking and line queries
    pub width: WDist,
    pub model: MotionModel,
}

#[derive(Debug, Clone)]
pub struct WeaponConfig {
    pub id: WeaponId,
    pub name: String,
    pub range: WDist,
    pub min_range: WDist,
    /// Launch sounds, one picked per shot
    pub report: Vec<String>,
    pub valid_targets: TargetTypes,
    pub invalid_targets: TargetTypes,
    pub projectile: ProjectileConfig,
    pub warheads: Vec<Warhead>,
}

impl WeaponConfig {
    /// Whether this weapon may be fired at something with `types`
    pub fn is_valid_against(&self, types: &TargetTypes) -> bool {
        target_types_allowed(types, &self.valid_targets, &self.invalid_targets)
    }
}
