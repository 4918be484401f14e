//! Read-only world state visible to effects while they tick

use std::collections::BTreeMap;
use std::sync::Arc;

use super::actor::Actor;
use super::players::PlayerRegistry;
use super::terrain::TerrainLayer;
use crate::core::config::SimulationConfig;
use crate::core::types::{ActorId, PlayerId, Relationship, Tick};
use crate::effects::ViewerContext;
use crate::geometry::{distance_along, distance_to_segment, WDist, WPos};
use crate::rules::WeaponRules;
use crate::spatial::SparseHashGrid;

/// Actors, players, terrain and rules. Effects receive `&WorldState` during
/// the tick phase; only the owning [`super::World`] mutates it, while
/// draining frame-end tasks.
#[derive(Debug)]
pub struct WorldState {
    pub(crate) config: SimulationConfig,
    pub(crate) rules: Arc<WeaponRules>,
    pub(crate) tick: Tick,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    pub(crate) index: SparseHashGrid,
    pub(crate) players: PlayerRegistry,
    pub(crate) terrain: TerrainLayer,
    pub(crate) local_viewer: ViewerContext,
    pub(crate) next_actor_id: u32,
    max_hit_radius: WDist,
}

impl WorldState {
    pub(crate) fn new(config: SimulationConfig, rules: Arc<WeaponRules>) -> Self {
        let index = SparseHashGrid::new(config.spatial_cell_size);
        Self {
            config,
            rules,
            tick: 0,
            actors: BTreeMap::new(),
            index,
            players: PlayerRegistry::new(),
            terrain: TerrainLayer::default(),
            local_viewer: ViewerContext::reveal_all(),
            next_actor_id: 1,
            max_hit_radius: WDist::ZERO,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn rules(&self) -> &WeaponRules {
        &self.rules
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Actors in id order
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.get(&id).map_or(false, |a| !a.is_dead())
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn terrain(&self) -> &TerrainLayer {
        &self.terrain
    }

    pub fn local_viewer(&self) -> &ViewerContext {
        &self.local_viewer
    }

    pub fn relationship(&self, a: PlayerId, b: PlayerId) -> Relationship {
        self.players.relationship(a, b)
    }

    /// Largest hit radius of any actor ever added. Area queries pad their
    /// radius by this so actors whose edge is in range are not missed.
    pub fn max_hit_radius(&self) -> WDist {
        self.max_hit_radius
    }

    /// Whether `pos` lies on the map
    pub fn contains(&self, pos: WPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.config.map_width && pos.y < self.config.map_height
    }

    /// Live actors whose center is within `radius` of `center`, in id order
    pub fn find_actors_in_circle(&self, center: WPos, radius: WDist) -> Vec<ActorId> {
        let r = radius.length() as i64;
        self.index
            .query_radius(center, radius.length())
            .into_iter()
            .filter(|id| {
                self.actors.get(id).map_or(false, |a| {
                    !a.is_dead() && (a.position - center).horizontal_length_squared() <= r * r
                })
            })
            .collect()
    }

    /// Live actors whose hit shape touches the segment thickened by `width`,
    /// ordered by distance from `start`
    pub fn find_actors_on_line(&self, start: WPos, end: WPos, width: WDist) -> Vec<ActorId> {
        let pad = width.length() + self.max_hit_radius.length();
        let mut hits: Vec<(i64, ActorId)> = self
            .index
            .query_segment(start, end, pad)
            .into_iter()
            .filter_map(|id| self.actors.get(&id))
            .filter(|a| !a.is_dead())
            .filter(|a| {
                let flat = a.position.with_z(0);
                distance_to_segment(start.with_z(0), end.with_z(0), flat)
                    <= width.length() + a.hit_radius().length()
            })
            .map(|a| (distance_along(start, end, a.position), a.id))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|(_, id)| id).collect()
    }

    pub(crate) fn insert_actor(&mut self, actor: Actor) {
        self.max_hit_radius = self.max_hit_radius.max(actor.hit_radius());
        self.index.insert(actor.id, actor.position);
        self.actors.insert(actor.id, actor);
    }

    pub(crate) fn take_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.index.remove(id);
        self.actors.remove(&id)
    }

    pub(crate) fn allocate_actor_id(&mut self) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        id
    }
}
