//! Damage warheads

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::trace;

use super::falloff::FalloffCurve;
use super::impact::{actors_in_range, inflict_damage, is_valid_against};
use super::{ImpactTarget, WarheadArgs, WarheadCommon};
use crate::effects::TickContext;
use crate::geometry::WDist;
use crate::rules::DefError;
use crate::world::clamp_to_blocker;

fn default_spread() -> WDist {
    WDist(43)
}

fn default_falloff() -> Vec<i32> {
    vec![100, 37, 14, 5, 0]
}

fn default_line_width() -> WDist {
    WDist(64)
}

/// Declared form of [`SpreadDamage`]. Without explicit `range` breakpoints
/// the falloff entries are spaced `spread` apart.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadDamageDef {
    pub damage: i32,
    #[serde(default = "default_spread")]
    pub spread: WDist,
    #[serde(default = "default_falloff")]
    pub falloff: Vec<i32>,
    #[serde(default)]
    pub range: Vec<WDist>,
    #[serde(default)]
    pub versus: BTreeMap<String, i32>,
    #[serde(default)]
    pub damage_types: Vec<String>,
}

impl SpreadDamageDef {
    pub fn freeze(self) -> Result<SpreadDamage, DefError> {
        let falloff = if self.range.is_empty() {
            FalloffCurve::from_spread(self.spread, self.falloff)
        } else {
            FalloffCurve::new(self.range, self.falloff)
        }
        .map_err(DefError::Falloff)?;
        Ok(SpreadDamage {
            damage: self.damage,
            falloff,
            versus: self.versus,
            damage_types: self.damage_types,
        })
    }
}

/// Area damage scaled by distance from the impact to each victim's hit shape
#[derive(Debug, Clone)]
pub struct SpreadDamage {
    pub damage: i32,
    pub falloff: FalloffCurve,
    pub versus: BTreeMap<String, i32>,
    pub damage_types: Vec<String>,
}

impl SpreadDamage {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, common: &WarheadCommon, args: &WarheadArgs) {
        let state = ctx.state();
        let center = args.impact_position;
        for victim in actors_in_range(state, center, self.falloff.outer_range()) {
            if !is_valid_against(common, state, victim, args) {
                continue;
            }
            let percent = self.falloff.evaluate(victim.distance_from_edge(center));
            inflict_damage(ctx, victim, self.damage, &self.versus, &[percent], &self.damage_types, args);
        }
    }
}

/// Damage to the targeted actor, or to actors whose hit shape covers the
/// impact point (within `spread`)
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDamage {
    pub damage: i32,
    #[serde(default)]
    pub spread: WDist,
    #[serde(default)]
    pub versus: BTreeMap<String, i32>,
    #[serde(default)]
    pub damage_types: Vec<String>,
}

impl TargetDamage {
    pub(crate) fn impact(
        &self,
        ctx: &mut TickContext<'_>,
        common: &WarheadCommon,
        target: &ImpactTarget,
        args: &WarheadArgs,
    ) {
        let state = ctx.state();
        let victims: Vec<_> = match target {
            ImpactTarget::Actor(id) => state.actor(*id).into_iter().collect(),
            ImpactTarget::Position(_) => actors_in_range(state, args.impact_position, self.spread),
        };
        for victim in victims {
            if victim.is_dead() || !is_valid_against(common, state, victim, args) {
                continue;
            }
            inflict_damage(ctx, victim, self.damage, &self.versus, &[], &self.damage_types, args);
        }
    }
}

/// Damage to every actor along the segment from the shot's source to the
/// impact point, stopping at the first blocker when `blockable`
#[derive(Debug, Clone, Deserialize)]
pub struct LineDamage {
    pub damage: i32,
    #[serde(default = "default_line_width")]
    pub width: WDist,
    #[serde(default)]
    pub blockable: bool,
    #[serde(default)]
    pub versus: BTreeMap<String, i32>,
    #[serde(default)]
    pub damage_types: Vec<String>,
}

impl LineDamage {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, common: &WarheadCommon, args: &WarheadArgs) {
        let state = ctx.state();
        let start = args.source;
        let end = if self.blockable {
            clamp_to_blocker(state, args.owner, start, args.impact_position, self.width, Some(args.source_actor))
        } else {
            args.impact_position
        };
        if end != args.impact_position {
            trace!(weapon = %args.weapon.name, "Line damage blocked short of impact");
        }

        for id in state.find_actors_on_line(start, end, self.width) {
            let Some(victim) = state.actor(id) else {
                continue;
            };
            if !is_valid_against(common, state, victim, args) {
                continue;
            }
            inflict_damage(ctx, victim, self.damage, &self.versus, &[], &self.damage_types, args);
        }
    }
}
