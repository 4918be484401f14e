//! The impact pipeline shared by every warhead kind

use std::collections::BTreeMap;
use tracing::trace;

use super::{ImpactTarget, WarheadArgs, WarheadCommon};
use crate::core::modifiers::apply_percentage_modifiers;
use crate::core::types::{target_types, target_types_allowed};
use crate::effects::TickContext;
use crate::geometry::{WDist, WPos};
use crate::world::{Actor, DamageRequest, FrameEndTask, WorldState};

/// Whether a warhead may act at all.
///
/// Rejects impacts while combat geometry debugging is on, impacts from a
/// dead firer unless tolerated, impacts off the map, and impacts on
/// excluded target types.
pub fn is_valid_impact(common: &WarheadCommon, state: &WorldState, target: &ImpactTarget, args: &WarheadArgs) -> bool {
    if state.config().combat_geometry_debug {
        return false;
    }
    if !common.tolerates_dead_firer && !state.is_alive(args.source_actor) {
        return false;
    }
    match target {
        ImpactTarget::Actor(id) => state
            .actor(*id)
            .filter(|a| !a.is_dead())
            .map_or(false, |victim| is_valid_against(common, state, victim, args)),
        ImpactTarget::Position(_) => {
            let pos = args.impact_position;
            if !state.contains(pos) {
                return false;
            }
            let types = if pos.z > common.air_threshold.0 {
                target_types(["Air"])
            } else {
                state.terrain().target_types_at(pos)
            };
            target_types_allowed(&types, &common.valid_targets, &common.invalid_targets)
        }
    }
}

/// Per-victim eligibility: relationship, target types and the firer itself
pub fn is_valid_against(common: &WarheadCommon, state: &WorldState, victim: &Actor, args: &WarheadArgs) -> bool {
    if victim.id == args.source_actor && !common.affects_parent {
        return false;
    }
    if !common
        .valid_relationships
        .contains(state.relationship(victim.owner, args.owner))
    {
        return false;
    }
    target_types_allowed(victim.target_types(), &common.valid_targets, &common.invalid_targets)
}

/// Live actors whose hit shape comes within `range` of `center`.
///
/// The spatial query is padded by the largest hit radius in the world so
/// large actors centred outside `range` are still found.
pub fn actors_in_range(state: &WorldState, center: WPos, range: WDist) -> Vec<&Actor> {
    let padded = WDist(range.0 + state.max_hit_radius().0);
    state
        .find_actors_in_circle(center, padded)
        .into_iter()
        .filter_map(|id| state.actor(id))
        .filter(|a| a.distance_from_edge(center) <= range)
        .collect()
}

/// Percentage from an armor versus table, 100 for unlisted armor
pub fn versus_percent(versus: &BTreeMap<String, i32>, victim: &Actor) -> i32 {
    victim
        .info
        .armor
        .as_ref()
        .and_then(|armor| versus.get(armor))
        .copied()
        .unwrap_or(100)
}

/// Queues damage on `victim`: `base` scaled by the firer's damage modifiers,
/// `extra` percentages and the versus entry for the victim's armor.
pub fn inflict_damage(
    ctx: &mut TickContext<'_>,
    victim: &Actor,
    base: i32,
    versus: &BTreeMap<String, i32>,
    extra: &[i32],
    damage_types: &[String],
    args: &WarheadArgs,
) {
    let mut percentages = Vec::with_capacity(args.modifiers.damage.len() + extra.len() + 1);
    percentages.extend_from_slice(&args.modifiers.damage);
    percentages.extend_from_slice(extra);
    percentages.push(versus_percent(versus, victim));
    let amount = apply_percentage_modifiers(base, &percentages);
    if amount == 0 {
        trace!(victim = %victim.id, "Damage rounded to zero");
        return;
    }

    trace!(victim = %victim.id, amount, weapon = %args.weapon.name, "Damage queued");
    ctx.add_frame_end_task(FrameEndTask::ApplyDamage(DamageRequest {
        target: victim.id,
        attacker: args.source_actor,
        attacker_owner: args.owner,
        amount,
        damage_types: damage_types.to_vec(),
    }));
}
