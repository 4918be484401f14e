//! Declared (TOML) form of the weapon rules
//!
//! ```toml
//! [weapons.cannon]
//! range = 6144
//! report = ["cannon1"]
//!
//! [weapons.cannon.projectile]
//! type = "Bullet"
//! speed = [682]
//! inaccuracy = 128
//!
//! [[weapons.cannon.warheads]]
//! type = "SpreadDamage"
//! damage = 4000
//! versus = { heavy = 50 }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::weapon::{InaccuracyType, MotionModel, WeaponId};
use crate::core::types::{target_types, TargetTypes};
use crate::geometry::WDist;
use crate::projectiles::{AreaBeamDef, BeamConfig, BulletConfig, ClusterDef, MissileConfig};
use crate::warheads::{
    CaptureWarhead, ExplosionWarhead, FireClusterDef, FlashWarhead, GrantConditionWarhead, LineDamage, ShakeWarhead,
    SpawnActorWarhead, SpreadDamageDef, TargetDamage, TintWarhead, Warhead, WarheadCommon, WarheadKind,
};

/// A problem in one weapon definition. The loader attaches the weapon name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefError {
    Falloff(String),
    Invalid { field: &'static str, reason: String },
    UnknownWeapon(String),
}

impl DefError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DefError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub weapons: BTreeMap<String, WeaponDef>,
}

fn default_weapon_targets() -> TargetTypes {
    target_types(["Ground", "Water"])
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaponDef {
    pub range: WDist,
    #[serde(default)]
    pub min_range: WDist,
    #[serde(default)]
    pub report: Vec<String>,
    #[serde(default = "default_weapon_targets")]
    pub valid_targets: TargetTypes,
    #[serde(default)]
    pub invalid_targets: TargetTypes,
    pub projectile: ProjectileDef,
    #[serde(default)]
    pub warheads: Vec<WarheadDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectileDef {
    #[serde(flatten)]
    pub common: ProjectileCommonDef,
    #[serde(flatten)]
    pub model: MotionModelDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectileCommonDef {
    pub inaccuracy: WDist,
    pub inaccuracy_type: InaccuracyType,
    pub arming_delay: u32,
    pub blockable: bool,
    pub width: WDist,
}

impl Default for ProjectileCommonDef {
    fn default() -> Self {
        Self {
            inaccuracy: WDist::ZERO,
            inaccuracy_type: InaccuracyType::default(),
            arming_delay: 0,
            blockable: false,
            width: WDist(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum MotionModelDef {
    Bullet(BulletConfig),
    Missile(MissileConfig),
    Beam(BeamConfig),
    AreaBeam(AreaBeamDef),
    Cluster(ClusterDef),
}

impl MotionModelDef {
    pub fn freeze(self, resolve: impl Fn(&str) -> Option<WeaponId>) -> Result<MotionModel, DefError> {
        Ok(match self {
            MotionModelDef::Bullet(config) => {
                config.validate()?;
                MotionModel::Bullet(Arc::new(config))
            }
            MotionModelDef::Missile(config) => {
                config.validate()?;
                MotionModel::Missile(Arc::new(config))
            }
            MotionModelDef::Beam(config) => {
                config.validate()?;
                MotionModel::Beam(Arc::new(config))
            }
            MotionModelDef::AreaBeam(def) => MotionModel::AreaBeam(Arc::new(def.freeze()?)),
            MotionModelDef::Cluster(def) => MotionModel::Cluster(Arc::new(def.freeze(resolve)?)),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarheadDef {
    #[serde(flatten)]
    pub common: WarheadCommon,
    #[serde(flatten)]
    pub kind: WarheadKindDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum WarheadKindDef {
    SpreadDamage(SpreadDamageDef),
    TargetDamage(TargetDamage),
    LineDamage(LineDamage),
    Capture(CaptureWarhead),
    GrantCondition(GrantConditionWarhead),
    FireCluster(FireClusterDef),
    SpawnActor(SpawnActorWarhead),
    Explosion(ExplosionWarhead),
    Tint(TintWarhead),
    Shake(ShakeWarhead),
    Flash(FlashWarhead),
}

impl WarheadDef {
    pub fn freeze(self, resolve: impl Fn(&str) -> Option<WeaponId>) -> Result<Warhead, DefError> {
        let kind = match self.kind {
            WarheadKindDef::SpreadDamage(def) => WarheadKind::SpreadDamage(def.freeze()?),
            WarheadKindDef::TargetDamage(w) => WarheadKind::TargetDamage(w),
            WarheadKindDef::LineDamage(w) => {
                if w.width < WDist::ZERO {
                    return Err(DefError::invalid("width", "must not be negative"));
                }
                WarheadKind::LineDamage(w)
            }
            WarheadKindDef::Capture(w) => {
                if w.types.is_empty() {
                    return Err(DefError::invalid("types", "capture needs at least one type"));
                }
                WarheadKind::Capture(w)
            }
            WarheadKindDef::GrantCondition(w) => {
                if w.condition.is_empty() {
                    return Err(DefError::invalid("condition", "must not be empty"));
                }
                WarheadKind::GrantCondition(w)
            }
            WarheadKindDef::FireCluster(def) => WarheadKind::FireCluster(def.freeze(resolve)?),
            WarheadKindDef::SpawnActor(w) => WarheadKind::SpawnActor(w),
            WarheadKindDef::Explosion(w) => WarheadKind::Explosion(w),
            WarheadKindDef::Tint(w) => WarheadKind::Tint(w),
            WarheadKindDef::Shake(w) => WarheadKind::Shake(w),
            WarheadKindDef::Flash(w) => WarheadKind::Flash(w),
        };
        Ok(Warhead {
            common: self.common,
            kind,
        })
    }
}
