//! Actors as seen by the projectile core
//!
//! Only the capabilities that projectiles and warheads interact with are
//! modelled: position, owner, hit shape, health and armor, target types,
//! and the optional "blocks projectiles", "capturable" and "jams missiles"
//! traits.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::modifiers::{ModifierKind, ModifierTrait, ShotModifiers};
use crate::core::types::{ActorId, PlayerId, RelationshipSet, TargetTypes};
use crate::geometry::{WDist, WPos};

fn default_target_types() -> TargetTypes {
    ["Ground".to_string()].into_iter().collect()
}

fn default_hit_radius() -> WDist {
    WDist(256)
}

/// Stops blockable projectiles passing through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksProjectiles {
    /// Projectiles above this height fly over. Zero means any height.
    #[serde(default)]
    pub height: WDist,
    #[serde(default)]
    pub valid_relationships: RelationshipSet,
}

impl Default for BlocksProjectiles {
    fn default() -> Self {
        Self {
            height: WDist::ZERO,
            valid_relationships: RelationshipSet::ALL,
        }
    }
}

/// Can be taken over by capture warheads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capturable {
    pub types: BTreeSet<String>,
    #[serde(default = "not_ally")]
    pub valid_relationships: RelationshipSet,
}

fn not_ally() -> RelationshipSet {
    RelationshipSet::NOT_ALLY
}

/// Diverts jammable missiles flying nearby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JamsMissiles {
    pub range: WDist,
    /// Percent chance per tick of diverting a missile in range
    #[serde(default = "default_jam_chance")]
    pub chance: i32,
    #[serde(default = "enemy_only")]
    pub deflection_relationships: RelationshipSet,
}

fn default_jam_chance() -> i32 {
    100
}

fn enemy_only() -> RelationshipSet {
    RelationshipSet::ENEMY
}

/// Declarative actor description, used for spawning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorTemplate {
    pub name: String,
    #[serde(default = "default_hit_radius")]
    pub hit_radius: WDist,
    /// `None` means the actor cannot be damaged
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub armor: Option<String>,
    #[serde(default = "default_target_types")]
    pub target_types: TargetTypes,
    #[serde(default)]
    pub blocks_projectiles: Option<BlocksProjectiles>,
    #[serde(default)]
    pub capturable: Option<Capturable>,
    #[serde(default)]
    pub jams_missiles: Option<JamsMissiles>,
    /// Evaluated in declaration order when a weapon fires
    #[serde(default)]
    pub modifiers: Vec<ModifierTrait>,
}

impl ActorTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hit_radius: default_hit_radius(),
            max_hp: None,
            armor: None,
            target_types: default_target_types(),
            blocks_projectiles: None,
            capturable: None,
            jams_missiles: None,
            modifiers: Vec::new(),
        }
    }

    pub fn with_health(mut self, hp: i32) -> Self {
        self.max_hp = Some(hp);
        self
    }

    pub fn with_armor(mut self, armor: impl Into<String>) -> Self {
        self.armor = Some(armor.into());
        self
    }

    pub fn with_hit_radius(mut self, radius: WDist) -> Self {
        self.hit_radius = radius;
        self
    }

    pub fn with_target_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn blocking(mut self, blocks: BlocksProjectiles) -> Self {
        self.blocks_projectiles = Some(blocks);
        self
    }

    pub fn capturable(mut self, capturable: Capturable) -> Self {
        self.capturable = Some(capturable);
        self
    }

    pub fn jamming(mut self, jams: JamsMissiles) -> Self {
        self.jams_missiles = Some(jams);
        self
    }

    pub fn with_modifier(mut self, modifier: ModifierTrait) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
}

/// A timed (or permanent, when `remaining` is `None`) condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTimer {
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub owner: PlayerId,
    pub position: WPos,
    pub info: ActorTemplate,
    pub health: Option<Health>,
    pub conditions: BTreeMap<String, ConditionTimer>,
}

impl Actor {
    pub fn new(id: ActorId, info: ActorTemplate, owner: PlayerId, position: WPos) -> Self {
        let health = info.max_hp.map(|max_hp| Health { hp: max_hp, max_hp });
        Self {
            id,
            owner,
            position,
            info,
            health,
            conditions: BTreeMap::new(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health.map_or(false, |h| h.hp <= 0)
    }

    pub fn hit_radius(&self) -> WDist {
        self.info.hit_radius
    }

    pub fn target_types(&self) -> &TargetTypes {
        &self.info.target_types
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.contains_key(condition)
    }

    /// Active modifier percentages of one kind, in declaration order
    pub fn modifiers(&self, kind: ModifierKind) -> Vec<i32> {
        self.info
            .modifiers
            .iter()
            .filter(|m| m.kind == kind)
            .filter(|m| m.requires_condition.as_deref().map_or(true, |c| self.has_condition(c)))
            .map(|m| m.percent)
            .collect()
    }

    /// Snapshot of every active modifier, taken when this actor fires
    pub fn shot_modifiers(&self) -> ShotModifiers {
        ShotModifiers::from_traits(&self.info.modifiers, |c| self.has_condition(c))
    }

    /// Distance from the edge of the hit shape to `pos`, never negative
    pub fn distance_from_edge(&self, pos: WPos) -> WDist {
        WDist(((self.position - pos).length() - self.hit_radius().length()).max(0))
    }

    /// Ticks down timed conditions, dropping the expired ones
    pub(crate) fn tick_conditions(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        for (name, timer) in self.conditions.iter_mut() {
            if let Some(remaining) = timer.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    expired.push(name.clone());
                }
            }
        }
        for name in &expired {
            self.conditions.remove(name);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_modifiers() {
        let info = ActorTemplate::new("tank")
            .with_modifier(ModifierTrait::new(ModifierKind::Damage, 150).when("veteran"))
            .with_modifier(ModifierTrait::new(ModifierKind::Damage, 90))
            .with_modifier(ModifierTrait::new(ModifierKind::Range, 120));
        let mut actor = Actor::new(ActorId(1), info, PlayerId(1), WPos::ZERO);
        assert_eq!(actor.modifiers(ModifierKind::Damage), vec![90]);
        actor
            .conditions
            .insert("veteran".into(), ConditionTimer { remaining: None });
        assert_eq!(actor.modifiers(ModifierKind::Damage), vec![150, 90]);
        assert_eq!(actor.modifiers(ModifierKind::Range), vec![120]);
    }

    #[test]
    fn test_timed_condition_expires() {
        let mut actor = Actor::new(ActorId(1), ActorTemplate::new("a"), PlayerId(1), WPos::ZERO);
        actor
            .conditions
            .insert("emp".into(), ConditionTimer { remaining: Some(2) });
        assert!(actor.tick_conditions().is_empty());
        assert_eq!(actor.tick_conditions(), vec!["emp".to_string()]);
        assert!(!actor.has_condition("emp"));
    }

    #[test]
    fn test_distance_from_edge() {
        let actor = Actor::new(
            ActorId(1),
            ActorTemplate::new("a").with_hit_radius(WDist(300)),
            PlayerId(1),
            WPos::new(1000, 0, 0),
        );
        assert_eq!(actor.distance_from_edge(WPos::ZERO), WDist(700));
        assert_eq!(actor.distance_from_edge(WPos::new(1100, 0, 0)), WDist(0));
    }

    #[test]
    fn test_invulnerable_actor_never_dies() {
        let actor = Actor::new(ActorId(1), ActorTemplate::new("rock"), PlayerId(0), WPos::ZERO);
        assert!(actor.health.is_none());
        assert!(!actor.is_dead());
    }
}
