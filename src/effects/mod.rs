//! Effects: the schedulable unit of the world
//!
//! Anything transient that lives in the world for a few ticks (projectiles,
//! explosions, fading contrails, delayed warheads) implements [`Effect`].
//! The world ticks every live effect in insertion order. During a tick an
//! effect only sees the world through [`TickContext`], which hands out a
//! shared `&WorldState` and a frame-end queue; the world itself is mutated
//! once all effects have ticked, when that queue is drained.

pub mod contrail;
pub mod delayed;
pub mod render;
pub mod sprite;

use std::fmt;

use crate::core::random::{CosmeticRandom, SharedRandom};
use crate::core::types::{EffectId, Tick};
use crate::geometry::WPos;
use crate::projectiles::{self, ShotArgs};
use crate::world::{FrameEndQueue, FrameEndTask, WorldState};

pub use contrail::{Contrail, ContrailConfig, ContrailFader};
pub use delayed::DelayedImpact;
pub use render::{BeamRenderShape, Color, Fog, Renderable, ViewerContext};
pub use sprite::{SpriteConfig, SpriteEffect, TrailConfig, TrailEmitter};

/// Lifecycle of an effect slot in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum EffectState {
    Active,
    /// A removal task is queued; the effect will not be ticked again.
    PendingRemoval,
    Removed,
}

/// Per-tick update plus a lazy, finite stream of renderables
pub trait Effect: fmt::Debug {
    /// Advance one tick. Must not assume anything it requests through
    /// `ctx` has happened until the next tick.
    fn tick(&mut self, ctx: &mut TickContext<'_>);

    /// Renderables for the current state. Called by the renderer between
    /// ticks; never mutates.
    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a>;

    /// Short name for logs and snapshots
    fn kind(&self) -> &'static str;

    /// Gameplay-relevant position, included in sync snapshots
    fn sync_position(&self) -> Option<WPos> {
        None
    }
}

/// Everything needed to construct a projectile: read access to the world
/// and both random streams.
pub struct LaunchContext<'a> {
    pub state: &'a WorldState,
    pub shared_random: &'a mut SharedRandom,
    pub cosmetic_random: &'a mut CosmeticRandom,
}

/// The view an effect gets of the world while it ticks.
pub struct TickContext<'a> {
    state: &'a WorldState,
    effect_id: Option<EffectId>,
    tasks: &'a mut FrameEndQueue,
    shared_random: &'a mut SharedRandom,
    cosmetic_random: &'a mut CosmeticRandom,
    removal_requested: bool,
}

impl<'a> TickContext<'a> {
    pub fn new(
        state: &'a WorldState,
        effect_id: Option<EffectId>,
        tasks: &'a mut FrameEndQueue,
        shared_random: &'a mut SharedRandom,
        cosmetic_random: &'a mut CosmeticRandom,
    ) -> Self {
        Self {
            state,
            effect_id,
            tasks,
            shared_random,
            cosmetic_random,
            removal_requested: false,
        }
    }

    pub fn state(&self) -> &'a WorldState {
        self.state
    }

    pub fn tick(&self) -> Tick {
        self.state.tick()
    }

    /// Id of the effect being ticked, `None` for impacts driven from outside the effect loop
    pub fn effect_id(&self) -> Option<EffectId> {
        self.effect_id
    }

    pub fn shared_random(&mut self) -> &mut SharedRandom {
        self.shared_random
    }

    pub fn cosmetic_random(&mut self) -> &mut CosmeticRandom {
        self.cosmetic_random
    }

    pub fn add_frame_end_task(&mut self, task: FrameEndTask) {
        self.tasks.push(task);
    }

    pub fn add_effect(&mut self, effect: impl Effect + 'static) {
        self.tasks.push(FrameEndTask::AddEffect(Box::new(effect)));
    }

    pub fn add_boxed_effect(&mut self, effect: Box<dyn Effect>) {
        self.tasks.push(FrameEndTask::AddEffect(effect));
    }

    /// Queue removal of the effect being ticked. It will not be ticked again.
    pub fn remove_self(&mut self) {
        if self.removal_requested {
            return;
        }
        self.removal_requested = true;
        if let Some(id) = self.effect_id {
            self.tasks.push(FrameEndTask::RemoveEffect(id));
        }
    }

    pub fn removal_requested(&self) -> bool {
        self.removal_requested
    }

    pub fn launch_context(&mut self) -> LaunchContext<'_> {
        LaunchContext {
            state: self.state,
            shared_random: &mut *self.shared_random,
            cosmetic_random: &mut *self.cosmetic_random,
        }
    }

    /// Build a projectile now (so its random draws happen in this tick's
    /// order) and queue it for insertion.
    pub fn launch(&mut self, args: ShotArgs) {
        let effects = projectiles::launch(args, &mut self.launch_context());
        for effect in effects {
            self.add_boxed_effect(effect);
        }
    }
}
