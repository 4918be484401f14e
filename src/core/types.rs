//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for actors.
///
/// Allocated from a per-world counter so every replica assigns the same ids
/// in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Unique identifier for effects living in the world's effect list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u64);

/// Player (owner) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The neutral world owner
    pub const NEUTRAL: PlayerId = PlayerId(0);
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Stance of one player towards another
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Ally,
    Neutral,
    Enemy,
}

/// A set of relationships, as used by warhead and blocker filters
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Relationship>", into = "Vec<Relationship>")]
pub struct RelationshipSet(u8);

impl RelationshipSet {
    pub const NONE: RelationshipSet = RelationshipSet(0);
    pub const ALL: RelationshipSet = RelationshipSet(0b111);
    pub const ENEMY: RelationshipSet = RelationshipSet(0b100);
    pub const NOT_ALLY: RelationshipSet = RelationshipSet(0b110);

    fn bit(r: Relationship) -> u8 {
        match r {
            Relationship::Ally => 0b001,
            Relationship::Neutral => 0b010,
            Relationship::Enemy => 0b100,
        }
    }

    pub fn contains(self, r: Relationship) -> bool {
        self.0 & Self::bit(r) != 0
    }

    pub fn with(self, r: Relationship) -> Self {
        RelationshipSet(self.0 | Self::bit(r))
    }
}

impl Default for RelationshipSet {
    fn default() -> Self {
        RelationshipSet::ALL
    }
}

impl From<Vec<Relationship>> for RelationshipSet {
    fn from(list: Vec<Relationship>) -> Self {
        list.into_iter().fold(RelationshipSet::NONE, RelationshipSet::with)
    }
}

impl From<RelationshipSet> for Vec<Relationship> {
    fn from(set: RelationshipSet) -> Self {
        [Relationship::Ally, Relationship::Neutral, Relationship::Enemy]
            .into_iter()
            .filter(|r| set.contains(*r))
            .collect()
    }
}

impl fmt::Debug for RelationshipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(Vec::<Relationship>::from(*self)).finish()
    }
}

/// Target type tags ("Ground", "Air", "Structure", ...)
pub type TargetTypes = BTreeSet<String>;

/// True when `types` overlaps `valid` and does not overlap `invalid`
pub fn target_types_allowed(types: &TargetTypes, valid: &TargetTypes, invalid: &TargetTypes) -> bool {
    types.iter().any(|t| valid.contains(t)) && !types.iter().any(|t| invalid.contains(t))
}

/// Builds a tag set from string literals
pub fn target_types<I, S>(items: I) -> TargetTypes
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_set_membership() {
        let set = RelationshipSet::from(vec![Relationship::Enemy, Relationship::Neutral]);
        assert!(set.contains(Relationship::Enemy));
        assert!(set.contains(Relationship::Neutral));
        assert!(!set.contains(Relationship::Ally));
        assert_eq!(set, RelationshipSet::NOT_ALLY);
    }

    #[test]
    fn test_relationship_set_serde() {
        let json = serde_json::to_string(&RelationshipSet::ENEMY).unwrap();
        assert_eq!(json, "[\"Enemy\"]");
        let back: RelationshipSet = serde_json::from_str("[\"Ally\",\"Enemy\"]").unwrap();
        assert!(back.contains(Relationship::Ally));
        assert!(!back.contains(Relationship::Neutral));
    }

    #[test]
    fn test_target_type_filter() {
        let valid = target_types(["Ground", "Water"]);
        let invalid = target_types(["Submarine"]);
        assert!(target_types_allowed(&target_types(["Ground", "Vehicle"]), &valid, &invalid));
        assert!(!target_types_allowed(&target_types(["Air"]), &valid, &invalid));
        assert!(!target_types_allowed(&target_types(["Water", "Submarine"]), &valid, &invalid));
    }

    #[test]
    fn test_actor_id_ordering() {
        assert!(ActorId(1) < ActorId(2));
        assert_eq!(format!("{}", ActorId(7)), "actor#7");
    }
}
