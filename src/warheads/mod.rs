//! Warheads: what happens where a shot lands
//!
//! A [`Warhead`] is immutable configuration. Every per-shot input arrives
//! through [`WarheadArgs`], so one instance serves every in-flight shot of
//! its weapon. All warhead kinds share the checks in [`impact`] and only
//! ever change the world by queueing frame-end tasks.

pub mod damage;
pub mod falloff;
pub mod feedback;
pub mod impact;
pub mod spawn;
pub mod status;

use serde::Deserialize;
use std::sync::Arc;
use tracing::trace;

use crate::core::modifiers::ShotModifiers;
use crate::core::types::{target_types, ActorId, PlayerId, RelationshipSet, TargetTypes};
use crate::effects::{DelayedImpact, TickContext};
use crate::geometry::{WAngle, WDist, WPos};
use crate::rules::WeaponConfig;

pub use damage::{LineDamage, SpreadDamage, SpreadDamageDef, TargetDamage};
pub use falloff::FalloffCurve;
pub use feedback::{ExplosionWarhead, FlashWarhead, ShakeWarhead, TintWarhead};
pub use spawn::{FireClusterDef, FireClusterWarhead, SpawnActorWarhead};
pub use status::{CaptureWarhead, GrantConditionWarhead};

/// Where a warhead lands: a bare position or a specific actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactTarget {
    Position(WPos),
    Actor(ActorId),
}

/// Per-impact inputs handed to every warhead of a weapon
#[derive(Debug, Clone)]
pub struct WarheadArgs {
    pub weapon: Arc<WeaponConfig>,
    /// Where the shot was fired from, used by line warheads
    pub source: WPos,
    pub source_actor: ActorId,
    pub owner: PlayerId,
    pub impact_position: WPos,
    pub impact_facing: WAngle,
    pub modifiers: ShotModifiers,
}

impl WarheadArgs {
    /// Args for a detonation with no travelling projectile
    pub fn at_position(weapon: Arc<WeaponConfig>, source_actor: ActorId, owner: PlayerId, position: WPos) -> Self {
        Self {
            weapon,
            source: position,
            source_actor,
            owner,
            impact_position: position,
            impact_facing: WAngle::ZERO,
            modifiers: ShotModifiers::default(),
        }
    }

    /// Copy with an extra damage percentage appended
    pub fn with_damage_modifier(&self, percent: i32) -> Self {
        let mut args = self.clone();
        args.modifiers.damage.push(percent);
        args
    }
}

fn default_valid_targets() -> TargetTypes {
    target_types(["Ground", "Water"])
}

fn default_air_threshold() -> WDist {
    WDist(128)
}

/// Settings every warhead kind understands
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WarheadCommon {
    pub valid_targets: TargetTypes,
    pub invalid_targets: TargetTypes,
    /// Relationships between victim and firer owners this warhead affects
    pub valid_relationships: RelationshipSet,
    /// Ticks between impact and this warhead applying
    pub delay: u32,
    /// Keep working after the firer has died
    pub tolerates_dead_firer: bool,
    /// Whether the firer itself can be a victim
    pub affects_parent: bool,
    /// Impacts higher than this above ground count as hitting "Air"
    pub air_threshold: WDist,
}

impl Default for WarheadCommon {
    fn default() -> Self {
        Self {
            valid_targets: default_valid_targets(),
            invalid_targets: TargetTypes::new(),
            valid_relationships: RelationshipSet::ALL,
            delay: 0,
            tolerates_dead_firer: false,
            affects_parent: false,
            air_threshold: default_air_threshold(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WarheadKind {
    SpreadDamage(SpreadDamage),
    TargetDamage(TargetDamage),
    LineDamage(LineDamage),
    Capture(CaptureWarhead),
    GrantCondition(GrantConditionWarhead),
    FireCluster(FireClusterWarhead),
    SpawnActor(SpawnActorWarhead),
    Explosion(ExplosionWarhead),
    Tint(TintWarhead),
    Shake(ShakeWarhead),
    Flash(FlashWarhead),
}

impl WarheadKind {
    pub fn name(&self) -> &'static str {
        match self {
            WarheadKind::SpreadDamage(_) => "spread-damage",
            WarheadKind::TargetDamage(_) => "target-damage",
            WarheadKind::LineDamage(_) => "line-damage",
            WarheadKind::Capture(_) => "capture",
            WarheadKind::GrantCondition(_) => "grant-condition",
            WarheadKind::FireCluster(_) => "fire-cluster",
            WarheadKind::SpawnActor(_) => "spawn-actor",
            WarheadKind::Explosion(_) => "explosion",
            WarheadKind::Tint(_) => "tint",
            WarheadKind::Shake(_) => "shake",
            WarheadKind::Flash(_) => "flash",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Warhead {
    pub common: WarheadCommon,
    pub kind: WarheadKind,
}

impl Warhead {
    pub fn new(kind: WarheadKind) -> Self {
        Self {
            common: WarheadCommon::default(),
            kind,
        }
    }

    /// Applies this warhead right away, ignoring `delay`
    pub fn do_impact(&self, ctx: &mut TickContext<'_>, target: &ImpactTarget, args: &WarheadArgs) {
        if !impact::is_valid_impact(&self.common, ctx.state(), target, args) {
            trace!(weapon = %args.weapon.name, warhead = self.kind.name(), "Impact rejected");
            return;
        }

        let common = &self.common;
        match &self.kind {
            WarheadKind::SpreadDamage(w) => w.impact(ctx, common, args),
            WarheadKind::TargetDamage(w) => w.impact(ctx, common, target, args),
            WarheadKind::LineDamage(w) => w.impact(ctx, common, args),
            WarheadKind::Capture(w) => w.impact(ctx, common, target, args),
            WarheadKind::GrantCondition(w) => w.impact(ctx, common, target, args),
            WarheadKind::FireCluster(w) => w.impact(ctx, args),
            WarheadKind::SpawnActor(w) => w.impact(ctx, args),
            WarheadKind::Explosion(w) => w.impact(ctx, args),
            WarheadKind::Tint(w) => w.impact(ctx, args),
            WarheadKind::Shake(w) => w.impact(ctx, args),
            WarheadKind::Flash(w) => w.impact(ctx),
        }
    }
}

/// Runs every warhead of `args.weapon`. Delayed warheads become
/// [`DelayedImpact`] effects.
pub fn impact_weapon(ctx: &mut TickContext<'_>, target: &ImpactTarget, args: &WarheadArgs) {
    for (index, warhead) in args.weapon.warheads.iter().enumerate() {
        if warhead.common.delay > 0 {
            ctx.add_effect(DelayedImpact::new(warhead.common.delay, index, *target, args.clone()));
        } else {
            warhead.do_impact(ctx, target, args);
        }
    }
}
