//! Projectile blocking
//!
//! Actors with the "blocks projectiles" trait stop blockable projectiles,
//! beams and line warheads. The blocked position is the point on the path
//! closest to the blocker's center.

use super::state::WorldState;
use crate::core::types::{ActorId, PlayerId};
use crate::geometry::{closest_point_on_segment, WDist, WPos};

/// First blocker between `start` and `end` for a shot fired by `owner`.
///
/// `ignore` is skipped so a blocking firer does not stop its own shots.
pub fn blocking_actor_between(
    state: &WorldState,
    owner: PlayerId,
    start: WPos,
    end: WPos,
    width: WDist,
    ignore: Option<ActorId>,
) -> Option<(ActorId, WPos)> {
    state
        .find_actors_on_line(start, end, width)
        .into_iter()
        .filter(|id| Some(*id) != ignore)
        .filter_map(|id| state.actor(id))
        .find_map(|actor| {
            let blocks = actor.info.blocks_projectiles?;
            if !blocks.valid_relationships.contains(state.relationship(actor.owner, owner)) {
                return None;
            }
            let hit = closest_point_on_segment(start, end, actor.position);
            if blocks.height > WDist::ZERO && hit.z - actor.position.z > blocks.height.length() {
                return None;
            }
            Some((actor.id, hit))
        })
}

/// Clamps `end` to the first blocker on the way from `start`, if any
pub fn clamp_to_blocker(
    state: &WorldState,
    owner: PlayerId,
    start: WPos,
    end: WPos,
    width: WDist,
    ignore: Option<ActorId>,
) -> WPos {
    blocking_actor_between(state, owner, start, end, width, ignore).map_or(end, |(_, hit)| hit)
}
