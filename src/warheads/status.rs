//! Warheads that change an actor's owner or conditions

use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::trace;

use super::impact::{actors_in_range, is_valid_against};
use super::{ImpactTarget, WarheadArgs, WarheadCommon};
use crate::effects::TickContext;
use crate::geometry::WDist;
use crate::world::{Actor, FrameEndTask, WorldState};

fn victims<'s>(state: &'s WorldState, target: &ImpactTarget, args: &WarheadArgs, range: WDist) -> Vec<&'s Actor> {
    match target {
        ImpactTarget::Actor(id) => state.actor(*id).filter(|a| !a.is_dead()).into_iter().collect(),
        ImpactTarget::Position(_) => actors_in_range(state, args.impact_position, range),
    }
}

/// Transfers ownership of capturable actors to the firer's owner
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureWarhead {
    /// Capture types this warhead provides; the victim must accept one
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub range: WDist,
}

impl CaptureWarhead {
    pub(crate) fn impact(
        &self,
        ctx: &mut TickContext<'_>,
        common: &WarheadCommon,
        target: &ImpactTarget,
        args: &WarheadArgs,
    ) {
        let state = ctx.state();
        for victim in victims(state, target, args, self.range) {
            if victim.owner == args.owner || !is_valid_against(common, state, victim, args) {
                continue;
            }
            let Some(capturable) = victim.info.capturable.as_ref() else {
                continue;
            };
            if capturable.types.is_disjoint(&self.types) {
                trace!(victim = %victim.id, "No matching capture type");
                continue;
            }
            if !capturable
                .valid_relationships
                .contains(state.relationship(victim.owner, args.owner))
            {
                continue;
            }
            ctx.add_frame_end_task(FrameEndTask::ChangeOwner {
                target: victim.id,
                new_owner: args.owner,
                capturer: args.source_actor,
            });
        }
    }
}

/// Grants a named condition, for `duration` ticks or permanently when zero
#[derive(Debug, Clone, Deserialize)]
pub struct GrantConditionWarhead {
    pub condition: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub range: WDist,
}

impl GrantConditionWarhead {
    pub(crate) fn impact(
        &self,
        ctx: &mut TickContext<'_>,
        common: &WarheadCommon,
        target: &ImpactTarget,
        args: &WarheadArgs,
    ) {
        let state = ctx.state();
        let duration = (self.duration > 0).then_some(self.duration);
        for victim in victims(state, target, args, self.range) {
            if !is_valid_against(common, state, victim, args) {
                continue;
            }
            ctx.add_frame_end_task(FrameEndTask::GrantCondition {
                target: victim.id,
                condition: self.condition.clone(),
                duration,
            });
        }
    }
}
