//! Per-shot arguments

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::modifiers::{apply_percentage_modifiers, ShotModifiers};
use crate::core::random::SharedRandom;
use crate::core::types::{ActorId, PlayerId};
use crate::geometry::{WAngle, WPos, WVec};
use crate::rules::{InaccuracyType, ProjectileConfig, WeaponConfig};
use crate::warheads::WarheadArgs;
use crate::world::{Actor, WorldState};

/// What a fire order aims at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Position(WPos),
    Actor(ActorId),
}

/// A target that may track a live actor.
///
/// Re-resolved every tick by the projectile that owns it. Once the actor
/// is gone the target is lost for good and stays at the last known position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidedTarget {
    actor: Option<ActorId>,
    last_known: WPos,
    lost: bool,
}

impl GuidedTarget {
    pub fn position(pos: WPos) -> Self {
        Self {
            actor: None,
            last_known: pos,
            lost: false,
        }
    }

    pub fn actor(id: ActorId, pos: WPos) -> Self {
        Self {
            actor: Some(id),
            last_known: pos,
            lost: false,
        }
    }

    /// `None` when the target actor does not exist or is dead
    pub fn from_target(state: &WorldState, target: Target) -> Option<Self> {
        match target {
            Target::Position(pos) => Some(Self::position(pos)),
            Target::Actor(id) => state
                .actor(id)
                .filter(|a| !a.is_dead())
                .map(|a| Self::actor(id, a.position)),
        }
    }

    /// Refreshes the tracked position and returns it
    pub fn update(&mut self, state: &WorldState) -> WPos {
        if let (Some(id), false) = (self.actor, self.lost) {
            match state.actor(id).filter(|a| !a.is_dead()) {
                Some(actor) => self.last_known = actor.position,
                None => self.lost = true,
            }
        }
        self.last_known
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn actor_id(&self) -> Option<ActorId> {
        self.actor
    }

    pub fn last_known(&self) -> WPos {
        self.last_known
    }
}

/// Everything a projectile needs from the firing event. Only the guided
/// target changes after construction.
#[derive(Debug, Clone)]
pub struct ShotArgs {
    pub weapon: Arc<WeaponConfig>,
    pub source: WPos,
    pub passive_target: WPos,
    pub guided_target: GuidedTarget,
    pub facing: WAngle,
    pub source_actor: ActorId,
    pub owner: PlayerId,
    pub modifiers: ShotModifiers,
}

impl ShotArgs {
    /// A shot fired by `firer`, snapshotting its modifiers
    pub fn from_actor(weapon: Arc<WeaponConfig>, firer: &Actor, target: GuidedTarget) -> Self {
        let passive_target = target.last_known();
        Self {
            weapon,
            source: firer.position,
            passive_target,
            guided_target: target,
            facing: (passive_target - firer.position).yaw(),
            source_actor: firer.id,
            owner: firer.owner,
            modifiers: firer.shot_modifiers(),
        }
    }

    /// A secondary shot launched from an impact point
    pub fn from_warhead(weapon: Arc<WeaponConfig>, parent: &WarheadArgs, target: WPos) -> Self {
        let source = parent.impact_position;
        Self {
            weapon,
            source,
            passive_target: target,
            guided_target: GuidedTarget::position(target),
            facing: (target - source).yaw(),
            source_actor: parent.source_actor,
            owner: parent.owner,
            modifiers: parent.modifiers.clone(),
        }
    }

    pub fn projectile(&self) -> &ProjectileConfig {
        &self.weapon.projectile
    }

    /// Weapon range after range modifiers
    pub fn weapon_range(&self) -> i32 {
        apply_percentage_modifiers(self.weapon.range.0, &self.modifiers.range)
    }

    /// Largest inaccuracy offset for this shot, after inaccuracy modifiers
    pub fn max_inaccuracy(&self) -> i32 {
        let projectile = self.projectile();
        let inaccuracy = apply_percentage_modifiers(projectile.inaccuracy.0, &self.modifiers.inaccuracy);
        let distance = (self.passive_target - self.source).length() as i64;
        match projectile.inaccuracy_type {
            InaccuracyType::Maximum => {
                let range = self.weapon_range() as i64;
                if range <= 0 {
                    inaccuracy
                } else {
                    (inaccuracy as i64 * distance / range) as i32
                }
            }
            InaccuracyType::PerCellIncrement => (inaccuracy as i64 * distance / 1024) as i32,
            InaccuracyType::Absolute => inaccuracy,
        }
    }

    /// The fixed aim offset for this shot. Draws from the synchronized
    /// stream only when the weapon has inaccuracy.
    pub fn inaccuracy_offset(&self, random: &mut SharedRandom, samples: u32) -> WVec {
        if self.projectile().inaccuracy.0 <= 0 {
            return WVec::ZERO;
        }
        let max = self.max_inaccuracy();
        random.pdf_vec(samples) * max / 1024
    }

    pub fn warhead_args(&self, impact_position: WPos, impact_facing: WAngle) -> WarheadArgs {
        WarheadArgs {
            weapon: self.weapon.clone(),
            source: self.source,
            source_actor: self.source_actor,
            owner: self.owner,
            impact_position,
            impact_facing,
            modifiers: self.modifiers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::rules::WeaponRules;
    use crate::world::{ActorTemplate, World};

    fn world() -> World {
        World::new(SimulationConfig::default(), Arc::new(WeaponRules::empty())).unwrap()
    }

    #[test]
    fn test_guided_target_tracks_then_loses() {
        let mut w = world();
        let id = w.spawn_actor(ActorTemplate::new("jeep"), PlayerId(1), WPos::new(1000, 1000, 0));
        let mut guided = GuidedTarget::from_target(w.state(), Target::Actor(id)).unwrap();

        w.move_actor(id, WPos::new(2000, 1000, 0));
        assert_eq!(guided.update(w.state()), WPos::new(2000, 1000, 0));
        assert!(!guided.is_lost());

        w.remove_actor(id);
        assert_eq!(guided.update(w.state()), WPos::new(2000, 1000, 0));
        assert!(guided.is_lost());
    }

    #[test]
    fn test_missing_actor_is_not_a_target() {
        let w = world();
        assert!(GuidedTarget::from_target(w.state(), Target::Actor(ActorId(42))).is_none());
    }
}
