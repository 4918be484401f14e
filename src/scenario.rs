//! Scenario files for the headless runner
//!
//! A scenario declares players, actors and timed fire orders in TOML:
//!
//! ```toml
//! [world]
//! shared_seed = 7
//!
//! [[players]]
//! name = "Red"
//! team = 1
//!
//! [[actors]]
//! id = "tank"
//! owner = "Red"
//! position = { x = 2048, y = 2048, z = 0 }
//! template = { name = "medium_tank", max_hp = 400 }
//!
//! [[orders]]
//! tick = 0
//! weapon = "cannon"
//! firer = "tank"
//! target = { actor = "jeep" }
//! ```
//!
//! An order with `tick = N` is issued once N ticks have run, before the
//! next one. Every name is checked against the rules and the declared
//! actors before the world is built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::SimulationConfig;
use crate::core::error::{OrdnanceError, Result};
use crate::core::types::{ActorId, PlayerId, Tick};
use crate::geometry::WPos;
use crate::projectiles::Target;
use crate::rules::{WeaponId, WeaponRules};
use crate::world::{ActorTemplate, Player, SimEvent, World, WorldSnapshot};

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioActor {
    /// Handle used by orders
    pub id: String,
    /// Player name, or "Neutral"
    pub owner: String,
    pub position: WPos,
    pub template: ActorTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTarget {
    Actor(String),
    Position(WPos),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FireOrder {
    pub tick: Tick,
    pub weapon: String,
    pub firer: String,
    pub target: OrderTarget,
    /// Extra shots after the first
    #[serde(default)]
    pub repeat: u32,
    /// Ticks between repeated shots
    #[serde(default = "default_repeat_interval")]
    pub interval: Tick,
}

fn default_repeat_interval() -> Tick {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerrainCell {
    pub cell: (i32, i32),
    #[serde(rename = "type")]
    pub terrain: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub world: SimulationConfig,
    pub players: Vec<Player>,
    pub terrain: Vec<TerrainCell>,
    pub actors: Vec<ScenarioActor>,
    pub orders: Vec<FireOrder>,
}

/// A fire order with every name resolved
#[derive(Debug, Clone, Copy)]
struct ResolvedOrder {
    tick: Tick,
    weapon: WeaponId,
    firer: ActorId,
    target: Target,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub seed: u64,
    pub ticks: Tick,
    pub shots: usize,
    pub events: Vec<SimEvent>,
    pub snapshot: WorldSnapshot,
}

impl ScenarioReport {
    /// Short human-readable summary
    pub fn summary(&self) -> String {
        let mut damage = 0i64;
        let mut kills = 0usize;
        let mut sounds = 0usize;
        for event in &self.events {
            match event {
                SimEvent::ActorDamaged { amount, .. } => damage += *amount as i64,
                SimEvent::ActorKilled { .. } => kills += 1,
                SimEvent::SoundPlayed { .. } => sounds += 1,
                _ => {}
            }
        }
        let mut out = format!(
            "seed {} | {} ticks | {} shots | {} events\n",
            self.seed,
            self.ticks,
            self.shots,
            self.events.len()
        );
        out.push_str(&format!(
            "damage dealt: {damage}, kills: {kills}, sounds: {sounds}, effects still live: {}\n",
            self.snapshot.effects.len()
        ));
        for actor in &self.snapshot.actors {
            let hp = actor.hp.map_or_else(|| "-".to_string(), |hp| hp.to_string());
            out.push_str(&format!(
                "  {} owner={} hp={} at ({}, {}, {})\n",
                actor.id, actor.owner.0, hp, actor.position.x, actor.position.y, actor.position.z
            ));
        }
        out
    }
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Builds the world and resolves every order against it
    fn build(&self, rules: Arc<WeaponRules>, seed: Option<u64>) -> Result<(World, Vec<ResolvedOrder>)> {
        let mut config = self.world.clone();
        if let Some(seed) = seed {
            config.shared_seed = seed;
        }
        let mut world = World::new(config, rules)?;

        let mut players: BTreeMap<String, PlayerId> = BTreeMap::new();
        players.insert("neutral".into(), PlayerId::NEUTRAL);
        for player in &self.players {
            let key = player.name.to_lowercase();
            if players.contains_key(&key) {
                return Err(OrdnanceError::Scenario(format!("player '{}' declared twice", player.name)));
            }
            let id = world.add_player(player.clone());
            players.insert(key, id);
        }

        for cell in &self.terrain {
            world.terrain_mut().set_cell(cell.cell, cell.terrain.clone());
        }

        let mut actors: BTreeMap<&str, ActorId> = BTreeMap::new();
        for actor in &self.actors {
            let owner = players
                .get(&actor.owner.to_lowercase())
                .copied()
                .ok_or_else(|| OrdnanceError::Scenario(format!("actor '{}' has unknown owner '{}'", actor.id, actor.owner)))?;
            if actors.contains_key(actor.id.as_str()) {
                return Err(OrdnanceError::Scenario(format!("actor '{}' declared twice", actor.id)));
            }
            let id = world.spawn_actor(actor.template.clone(), owner, actor.position);
            actors.insert(actor.id.as_str(), id);
        }

        let lookup = |handle: &str| {
            actors
                .get(handle)
                .copied()
                .ok_or_else(|| OrdnanceError::Scenario(format!("order refers to unknown actor '{handle}'")))
        };
        let mut orders = Vec::new();
        for order in &self.orders {
            let weapon = world
                .rules()
                .id_of(&order.weapon)
                .ok_or_else(|| OrdnanceError::Scenario(format!("order fires unknown weapon '{}'", order.weapon)))?;
            let firer = lookup(&order.firer)?;
            let target = match &order.target {
                OrderTarget::Actor(handle) => Target::Actor(lookup(handle)?),
                OrderTarget::Position(pos) => Target::Position(*pos),
            };
            if order.repeat > 0 && order.interval == 0 {
                return Err(OrdnanceError::Scenario(format!(
                    "order for '{}' repeats with a zero interval",
                    order.weapon
                )));
            }
            for shot in 0..=order.repeat as Tick {
                orders.push(ResolvedOrder {
                    tick: order.tick + shot * order.interval,
                    weapon,
                    firer,
                    target,
                });
            }
        }
        // stable, so orders on one tick keep declaration order
        orders.sort_by_key(|o| o.tick);
        Ok((world, orders))
    }

    /// Runs `ticks` ticks, issuing orders as they come due
    pub fn run(&self, rules: Arc<WeaponRules>, ticks: Tick, seed: Option<u64>) -> Result<ScenarioReport> {
        let (mut world, orders) = self.build(rules, seed)?;
        info!(
            actors = self.actors.len(),
            orders = orders.len(),
            ticks,
            "Running scenario"
        );

        let mut events = Vec::new();
        let mut pending = orders.iter().peekable();
        let mut shots = 0usize;
        for _ in 0..ticks {
            let now = world.tick_count();
            while let Some(order) = pending.next_if(|o| o.tick <= now) {
                let launched = world.fire_weapon(order.weapon, order.firer, order.target);
                debug!(tick = now, weapon = %order.weapon, effects = launched.len(), "Order issued");
                if !launched.is_empty() {
                    shots += 1;
                }
            }
            events.extend(world.tick());
        }

        Ok(ScenarioReport {
            seed: world.state().config().shared_seed,
            ticks: world.tick_count(),
            shots,
            events,
            snapshot: world.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
        [weapons.cannon]
        range = 8192
        report = ["cannon1"]
        [weapons.cannon.projectile]
        type = "Bullet"
        speed = [512]
        [[weapons.cannon.warheads]]
        type = "TargetDamage"
        damage = 60
        spread = 256
    "#;

    const SCENARIO: &str = r#"
        [world]
        shared_seed = 4

        [[players]]
        name = "Red"
        team = 1

        [[players]]
        name = "Blue"
        team = 2

        [[actors]]
        id = "tank"
        owner = "Red"
        position = { x = 2048, y = 2048, z = 0 }
        template = { name = "tank", max_hp = 400 }

        [[actors]]
        id = "jeep"
        owner = "blue"
        position = { x = 4096, y = 2048, z = 0 }
        template = { name = "jeep", max_hp = 100 }

        [[orders]]
        tick = 0
        weapon = "Cannon"
        firer = "tank"
        target = { actor = "jeep" }
        repeat = 1
        interval = 5
    "#;

    fn rules() -> Arc<WeaponRules> {
        Arc::new(WeaponRules::from_toml_str(RULES).unwrap())
    }

    #[test]
    fn test_scenario_runs_and_kills() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let report = scenario.run(rules(), 20, None).unwrap();
        assert_eq!(report.seed, 4);
        assert_eq!(report.ticks, 20);
        assert_eq!(report.shots, 2);
        let damage: Vec<i32> = report
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::ActorDamaged { amount, .. } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(damage, vec![60, 60]);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ActorKilled { .. })));
        assert!(report.summary().contains("kills: 1"));
    }

    #[test]
    fn test_seed_override() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let report = scenario.run(rules(), 1, Some(99)).unwrap();
        assert_eq!(report.seed, 99);
    }

    #[test]
    fn test_unknown_actor_in_order_is_an_error() {
        let mut scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        scenario.orders[0].firer = "ghost".into();
        let err = scenario.run(rules(), 1, None).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_unknown_weapon_in_order_is_an_error() {
        let mut scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        scenario.orders[0].weapon = "railgun".into();
        assert!(matches!(
            scenario.run(rules(), 1, None),
            Err(OrdnanceError::Scenario(_))
        ));
    }
}
