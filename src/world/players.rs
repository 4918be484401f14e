//! Players and the stances between them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{PlayerId, Relationship};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Players sharing a team are allies
    #[serde(default)]
    pub team: Option<u32>,
    /// Non-combatant players (the world owner, civilians) are neutral to everyone
    #[serde(default)]
    pub non_combatant: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.players.insert(
            PlayerId::NEUTRAL,
            Player {
                name: "Neutral".into(),
                team: None,
                non_combatant: true,
            },
        );
        registry
    }

    /// Adds a player under the next free id
    pub fn add(&mut self, player: Player) -> PlayerId {
        let id = PlayerId(self.players.keys().next_back().map_or(0, |p| p.0 + 1));
        self.players.insert(id, player);
        id
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players.iter().map(|(id, p)| (*id, p))
    }

    /// Stance of `a` towards `b`. Unknown players are treated as neutral.
    pub fn relationship(&self, a: PlayerId, b: PlayerId) -> Relationship {
        if a == b {
            return Relationship::Ally;
        }
        match (self.players.get(&a), self.players.get(&b)) {
            (Some(pa), Some(pb)) => {
                if pa.non_combatant || pb.non_combatant {
                    Relationship::Neutral
                } else if pa.team.is_some() && pa.team == pb.team {
                    Relationship::Ally
                } else {
                    Relationship::Enemy
                }
            }
            _ => Relationship::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, team: Option<u32>) -> Player {
        Player {
            name: name.into(),
            team,
            non_combatant: false,
        }
    }

    #[test]
    fn test_relationships() {
        let mut registry = PlayerRegistry::new();
        let a = registry.add(player("a", Some(1)));
        let b = registry.add(player("b", Some(1)));
        let c = registry.add(player("c", Some(2)));
        let d = registry.add(player("d", None));
        assert_eq!(registry.relationship(a, a), Relationship::Ally);
        assert_eq!(registry.relationship(a, b), Relationship::Ally);
        assert_eq!(registry.relationship(a, c), Relationship::Enemy);
        assert_eq!(registry.relationship(d, a), Relationship::Enemy);
        assert_eq!(registry.relationship(a, PlayerId::NEUTRAL), Relationship::Neutral);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut registry = PlayerRegistry::new();
        assert_eq!(registry.add(player("a", None)), PlayerId(1));
        assert_eq!(registry.add(player("b", None)), PlayerId(2));
    }
}
