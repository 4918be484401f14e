//! The simulated world
//!
//! [`World`] owns the actors (inside [`WorldState`]), the ordered effect
//! list, the frame-end queue and both random streams. A tick runs in two
//! phases: every live effect ticks in insertion order against a shared
//! `&WorldState`, then the frame-end queue is drained in FIFO order and is
//! the only place actors and effects are added, removed or changed.

pub mod actor;
pub mod blocking;
pub mod events;
pub mod feedback;
pub mod players;
pub mod snapshot;
pub mod state;
pub mod task;
pub mod terrain;

use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::core::config::SimulationConfig;
use crate::core::error::{OrdnanceError, Result};
use crate::core::random::{CosmeticRandom, SharedRandom};
use crate::core::types::{ActorId, EffectId, PlayerId, Tick};
use crate::effects::{Effect, EffectState, LaunchContext, Renderable, TickContext, ViewerContext};
use crate::geometry::{WDist, WPos};
use crate::projectiles::{self, GuidedTarget, ShotArgs, Target};
use crate::rules::{WeaponId, WeaponRules};
use crate::warheads::{impact_weapon, ImpactTarget, WarheadArgs};

pub use actor::{Actor, ActorTemplate, BlocksProjectiles, Capturable, ConditionTimer, Health, JamsMissiles};
pub use blocking::{blocking_actor_between, clamp_to_blocker};
pub use events::{EventLog, SimEvent};
pub use feedback::{AreaTint, FeedbackLayers};
pub use players::{Player, PlayerRegistry};
pub use snapshot::{ActorSnapshot, EffectSnapshot, WorldSnapshot};
pub use state::WorldState;
pub use task::{DamageRequest, FrameEndQueue, FrameEndTask};
pub use terrain::TerrainLayer;

#[derive(Debug)]
struct EffectSlot {
    id: EffectId,
    effect: Box<dyn Effect>,
    state: EffectState,
}

#[derive(Debug)]
pub struct World {
    state: WorldState,
    effects: Vec<EffectSlot>,
    frame_end: FrameEndQueue,
    shared_random: SharedRandom,
    cosmetic_random: CosmeticRandom,
    feedback: FeedbackLayers,
    events: EventLog,
    next_effect_id: u64,
    flushing: bool,
}

impl World {
    pub fn new(config: SimulationConfig, rules: Arc<WeaponRules>) -> Result<Self> {
        config.validate().map_err(OrdnanceError::InvalidConfig)?;
        info!(
            seed = config.shared_seed,
            weapons = rules.len(),
            "Creating world {}x{}",
            config.map_width,
            config.map_height
        );
        Ok(Self {
            shared_random: SharedRandom::new(config.shared_seed),
            cosmetic_random: CosmeticRandom::new(config.cosmetic_seed),
            state: WorldState::new(config, rules),
            effects: Vec::new(),
            frame_end: FrameEndQueue::new(),
            feedback: FeedbackLayers::default(),
            events: EventLog::default(),
            next_effect_id: 1,
            flushing: false,
        })
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn tick_count(&self) -> Tick {
        self.state.tick
    }

    pub fn rules(&self) -> &WeaponRules {
        &self.state.rules
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.state.actor(id)
    }

    pub fn find_actors_in_circle(&self, center: WPos, radius: WDist) -> Vec<ActorId> {
        self.state.find_actors_in_circle(center, radius)
    }

    pub fn find_actors_on_line(&self, start: WPos, end: WPos, width: WDist) -> Vec<ActorId> {
        self.state.find_actors_on_line(start, end, width)
    }

    pub fn feedback(&self) -> &FeedbackLayers {
        &self.feedback
    }

    pub fn shared_random_draws(&self) -> u64 {
        self.shared_random.draws()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Live effect ids in tick order
    pub fn effect_ids(&self) -> Vec<EffectId> {
        self.effects.iter().map(|s| s.id).collect()
    }

    pub fn effect_kinds(&self) -> Vec<&'static str> {
        self.effects.iter().map(|s| s.effect.kind()).collect()
    }

    pub fn effect_state(&self, id: EffectId) -> Option<EffectState> {
        match self.effects.iter().find(|s| s.id == id) {
            Some(slot) => Some(slot.state),
            None if id.0 > 0 && id.0 < self.next_effect_id => Some(EffectState::Removed),
            None => None,
        }
    }

    /// Every renderable of every live effect plus the tint layer
    pub fn render<'a>(&'a self, viewer: &'a ViewerContext) -> impl Iterator<Item = Renderable> + 'a {
        self.effects
            .iter()
            .flat_map(move |slot| slot.effect.render(viewer))
            .chain(self.feedback.render(viewer))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.state.tick,
            actors: self
                .state
                .actors()
                .map(|a| ActorSnapshot {
                    id: a.id,
                    owner: a.owner,
                    position: a.position,
                    hp: a.health.map(|h| h.hp),
                    conditions: a.conditions.iter().map(|(k, v)| (k.clone(), v.remaining)).collect(),
                })
                .collect(),
            effects: self
                .effects
                .iter()
                .map(|s| EffectSnapshot {
                    id: s.id,
                    kind: s.effect.kind(),
                    state: s.state,
                    position: s.effect.sync_position(),
                })
                .collect(),
            shared_random_draws: self.shared_random.draws(),
        }
    }

    // ========================================================================
    // SETUP AND DIRECT MUTATION (never called while effects tick)
    // ========================================================================

    pub fn add_player(&mut self, player: Player) -> PlayerId {
        self.state.players.add(player)
    }

    pub fn terrain_mut(&mut self) -> &mut TerrainLayer {
        &mut self.state.terrain
    }

    pub fn set_local_viewer(&mut self, viewer: ViewerContext) {
        self.state.local_viewer = viewer;
    }

    pub fn spawn_actor(&mut self, template: ActorTemplate, owner: PlayerId, position: WPos) -> ActorId {
        let id = self.state.allocate_actor_id();
        self.events.push(SimEvent::ActorSpawned {
            tick: self.state.tick,
            actor: id,
            template: template.name.clone(),
            owner,
        });
        self.state.insert_actor(Actor::new(id, template, owner, position));
        id
    }

    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        match self.state.take_actor(id) {
            Some(_) => {
                self.events.push(SimEvent::ActorRemoved {
                    tick: self.state.tick,
                    actor: id,
                });
                true
            }
            None => false,
        }
    }

    /// Moves an actor, as the external movement system would between ticks
    pub fn move_actor(&mut self, id: ActorId, position: WPos) -> bool {
        match self.state.actors.get_mut(&id) {
            Some(actor) => {
                actor.position = position;
                self.state.index.insert(id, position);
                true
            }
            None => false,
        }
    }

    pub fn add_effect(&mut self, effect: impl Effect + 'static) -> EffectId {
        self.add_boxed_effect(Box::new(effect))
    }

    pub fn add_boxed_effect(&mut self, effect: Box<dyn Effect>) -> EffectId {
        let id = EffectId(self.next_effect_id);
        self.next_effect_id += 1;
        trace!(%id, kind = effect.kind(), "Adding effect");
        self.effects.push(EffectSlot {
            id,
            effect,
            state: EffectState::Active,
        });
        id
    }

    /// Removes an effect, keeping the order of the others
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let Some(index) = self.effects.iter().position(|s| s.id == id) else {
            return false;
        };
        let slot = self.effects.remove(index);
        self.events.push(SimEvent::EffectRemoved {
            tick: self.state.tick,
            effect: id,
            kind: slot.effect.kind(),
        });
        true
    }

    /// Queues a task for the next flush
    pub fn add_frame_end_task(&mut self, task: FrameEndTask) {
        self.frame_end.push(task);
    }

    // ========================================================================
    // FIRING
    // ========================================================================

    /// Fires `weapon` from `firer` at `target`.
    ///
    /// A dead firer, an unknown weapon or a vanished target actor fire
    /// nothing and return no ids.
    pub fn fire_weapon(&mut self, weapon: WeaponId, firer: ActorId, target: Target) -> Vec<EffectId> {
        let Some(config) = self.state.rules.get(weapon).cloned() else {
            warn!(?weapon, "Fire order for unknown weapon");
            return Vec::new();
        };
        let Some(actor) = self.state.actor(firer).filter(|a| !a.is_dead()) else {
            debug!(%firer, weapon = %config.name, "Firer is gone, shot dropped");
            return Vec::new();
        };
        let Some(guided) = GuidedTarget::from_target(&self.state, target) else {
            debug!(%firer, weapon = %config.name, "Target is gone, shot dropped");
            return Vec::new();
        };
        let args = ShotArgs::from_actor(config, actor, guided);
        self.launch(args)
    }

    /// Fires by weapon name; unknown names fire nothing
    pub fn fire_weapon_named(&mut self, weapon: &str, firer: ActorId, target: Target) -> Vec<EffectId> {
        match self.state.rules.id_of(weapon) {
            Some(id) => self.fire_weapon(id, firer, target),
            None => {
                warn!(weapon, "Fire order for unknown weapon name");
                Vec::new()
            }
        }
    }

    /// Creates the projectile(s) for a prepared shot and adds them
    pub fn launch(&mut self, args: ShotArgs) -> Vec<EffectId> {
        let report = self.cosmetic_random.pick(&args.weapon.report).cloned();
        let source = args.source;
        let effects = {
            let mut ctx = LaunchContext {
                state: &self.state,
                shared_random: &mut self.shared_random,
                cosmetic_random: &mut self.cosmetic_random,
            };
            projectiles::launch(args, &mut ctx)
        };
        if let Some(sound) = report {
            self.apply_task(FrameEndTask::PlaySound {
                sound,
                position: source,
            });
        }
        effects.into_iter().map(|e| self.add_boxed_effect(e)).collect()
    }

    /// Detonates a weapon's warheads at a point right away, e.g. for a death
    /// explosion. Resulting mutations are flushed before returning, unless
    /// this is called from a frame-end callback: then they join the flush
    /// already in progress.
    pub fn detonate(&mut self, weapon: WeaponId, position: WPos, firer: ActorId) {
        let Some(config) = self.state.rules.get(weapon).cloned() else {
            warn!(?weapon, "Detonation of unknown weapon");
            return;
        };
        let owner = self.state.actor(firer).map_or(PlayerId::NEUTRAL, |a| a.owner);
        let args = WarheadArgs::at_position(config, firer, owner, position);
        {
            let mut ctx = TickContext::new(
                &self.state,
                None,
                &mut self.frame_end,
                &mut self.shared_random,
                &mut self.cosmetic_random,
            );
            impact_weapon(&mut ctx, &ImpactTarget::Position(position), &args);
        }
        if !self.flushing {
            self.flush_frame_end_tasks();
        }
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advances one tick and returns the events it produced
    pub fn tick(&mut self) -> Vec<SimEvent> {
        self.state.tick += 1;

        for slot in self.effects.iter_mut() {
            if slot.state != EffectState::Active {
                continue;
            }
            if self.frame_end.is_removal_pending(slot.id) {
                slot.state = EffectState::PendingRemoval;
                continue;
            }

            let mut ctx = TickContext::new(
                &self.state,
                Some(slot.id),
                &mut self.frame_end,
                &mut self.shared_random,
                &mut self.cosmetic_random,
            );
            slot.effect.tick(&mut ctx);
            if ctx.removal_requested() {
                slot.state = EffectState::PendingRemoval;
            }
        }

        self.flush_frame_end_tasks();
        self.tick_timers();
        self.events.drain()
    }

    /// Drains the frame-end queue, including tasks queued by tasks
    fn flush_frame_end_tasks(&mut self) {
        let limit = self.state.config.max_frame_end_tasks;
        let mut applied = 0usize;
        self.flushing = true;
        while let Some(task) = self.frame_end.pop() {
            if applied == limit {
                error!(
                    tick = self.state.tick,
                    remaining = self.frame_end.len() + 1,
                    "Frame-end task limit reached, dropping the rest"
                );
                self.frame_end.clear();
                self.drop_pending_removals();
                break;
            }
            applied += 1;
            self.apply_task(task);
        }
        self.flushing = false;
        if applied > 0 {
            debug!(tick = self.state.tick, applied, effects = self.effects.len(), "Flushed frame-end tasks");
        }
    }

    /// Removes slots whose removal task was dropped with the queue
    fn drop_pending_removals(&mut self) {
        let orphaned: Vec<EffectId> = self
            .effects
            .iter()
            .filter(|s| s.state == EffectState::PendingRemoval)
            .map(|s| s.id)
            .collect();
        for id in orphaned {
            self.remove_effect(id);
        }
    }

    fn apply_task(&mut self, task: FrameEndTask) {
        let tick = self.state.tick;
        match task {
            FrameEndTask::AddEffect(effect) => {
                self.add_boxed_effect(effect);
            }
            FrameEndTask::RemoveEffect(id) => {
                self.remove_effect(id);
            }
            FrameEndTask::ApplyDamage(request) => self.apply_damage(request),
            FrameEndTask::GrantCondition {
                target,
                condition,
                duration,
            } => {
                if let Some(actor) = self.state.actors.get_mut(&target) {
                    actor
                        .conditions
                        .insert(condition.clone(), ConditionTimer { remaining: duration });
                    self.events.push(SimEvent::ConditionGranted {
                        tick,
                        actor: target,
                        condition,
                        duration,
                    });
                }
            }
            FrameEndTask::ChangeOwner {
                target,
                new_owner,
                capturer,
            } => {
                if let Some(actor) = self.state.actors.get_mut(&target) {
                    let old_owner = actor.owner;
                    if old_owner != new_owner {
                        actor.owner = new_owner;
                        trace!(%target, %capturer, "Owner changed");
                        self.events.push(SimEvent::OwnerChanged {
                            tick,
                            actor: target,
                            old_owner,
                            new_owner,
                        });
                    }
                }
            }
            FrameEndTask::SpawnActor {
                template,
                owner,
                position,
            } => {
                self.spawn_actor(template, owner, position);
            }
            FrameEndTask::RemoveActor(id) => {
                self.remove_actor(id);
            }
            FrameEndTask::PlaySound { sound, position } => {
                if self.state.local_viewer.obscures(position) {
                    trace!(sound, "Sound under fog dropped");
                } else {
                    self.events.push(SimEvent::SoundPlayed { tick, sound, position });
                }
            }
            FrameEndTask::ShakeScreen {
                position,
                intensity,
                duration,
            } => {
                self.feedback.add_shake(tick, position, intensity, duration);
                self.events.push(SimEvent::ScreenShake {
                    tick,
                    position,
                    intensity,
                    duration,
                });
            }
            FrameEndTask::FlashScreen { color, duration } => {
                self.feedback.add_flash(tick, color, duration);
                self.events.push(SimEvent::ScreenFlash { tick, color, duration });
            }
            FrameEndTask::TintArea(tint) => {
                self.feedback.add_tint(tick, tint);
                self.events.push(SimEvent::AreaTinted {
                    tick,
                    center: tint.center,
                    radius: tint.radius,
                });
            }
            FrameEndTask::Callback(callback) => callback(self),
        }
    }

    fn apply_damage(&mut self, request: DamageRequest) {
        let tick = self.state.tick;
        let Some(actor) = self.state.actors.get_mut(&request.target) else {
            return;
        };
        let Some(health) = actor.health.as_mut() else {
            return;
        };
        if health.hp <= 0 {
            return;
        }

        health.hp = (health.hp - request.amount).min(health.max_hp);
        let remaining_hp = health.hp;
        self.events.push(SimEvent::ActorDamaged {
            tick,
            actor: request.target,
            attacker: request.attacker,
            amount: request.amount,
            remaining_hp,
            damage_types: request.damage_types,
        });

        if remaining_hp <= 0 {
            debug!(actor = %request.target, attacker = %request.attacker, "Actor killed");
            self.events.push(SimEvent::ActorKilled {
                tick,
                actor: request.target,
                attacker: request.attacker,
            });
            self.state.take_actor(request.target);
        }
    }

    fn tick_timers(&mut self) {
        let tick = self.state.tick;
        for actor in self.state.actors.values_mut() {
            for condition in actor.tick_conditions() {
                self.events.push(SimEvent::ConditionExpired {
                    tick,
                    actor: actor.id,
                    condition,
                });
            }
        }
        self.feedback.expire(tick);
    }
}
