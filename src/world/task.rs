//! Frame-end tasks
//!
//! World mutations requested while effects tick are recorded here as
//! tagged commands and applied in FIFO order once every effect has ticked.

use ahash::AHashSet;
use std::collections::VecDeque;
use std::fmt;

use super::actor::ActorTemplate;
use super::feedback::AreaTint;
use super::World;
use crate::core::types::{ActorId, EffectId, PlayerId};
use crate::effects::{Color, Effect};
use crate::geometry::WPos;

/// A resolved damage application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageRequest {
    pub target: ActorId,
    pub attacker: ActorId,
    pub attacker_owner: PlayerId,
    /// Negative values heal
    pub amount: i32,
    pub damage_types: Vec<String>,
}

/// One deferred world mutation
pub enum FrameEndTask {
    AddEffect(Box<dyn Effect>),
    RemoveEffect(EffectId),
    ApplyDamage(DamageRequest),
    GrantCondition {
        target: ActorId,
        condition: String,
        /// `None` grants a permanent condition
        duration: Option<u32>,
    },
    ChangeOwner {
        target: ActorId,
        new_owner: PlayerId,
        capturer: ActorId,
    },
    SpawnActor {
        template: ActorTemplate,
        owner: PlayerId,
        position: WPos,
    },
    RemoveActor(ActorId),
    /// Dropped at flush time when the position is fogged for the local viewer
    PlaySound {
        sound: String,
        position: WPos,
    },
    ShakeScreen {
        position: WPos,
        intensity: i32,
        duration: u32,
    },
    FlashScreen {
        color: Color,
        duration: u32,
    },
    TintArea(AreaTint),
    /// Escape hatch for mutations that have no dedicated variant
    Callback(Box<dyn FnOnce(&mut World)>),
}

impl FrameEndTask {
    pub fn callback(f: impl FnOnce(&mut World) + 'static) -> Self {
        FrameEndTask::Callback(Box::new(f))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameEndTask::AddEffect(_) => "add-effect",
            FrameEndTask::RemoveEffect(_) => "remove-effect",
            FrameEndTask::ApplyDamage(_) => "apply-damage",
            FrameEndTask::GrantCondition { .. } => "grant-condition",
            FrameEndTask::ChangeOwner { .. } => "change-owner",
            FrameEndTask::SpawnActor { .. } => "spawn-actor",
            FrameEndTask::RemoveActor(_) => "remove-actor",
            FrameEndTask::PlaySound { .. } => "play-sound",
            FrameEndTask::ShakeScreen { .. } => "shake-screen",
            FrameEndTask::FlashScreen { .. } => "flash-screen",
            FrameEndTask::TintArea(_) => "tint-area",
            FrameEndTask::Callback(_) => "callback",
        }
    }
}

impl fmt::Debug for FrameEndTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameEndTask::AddEffect(effect) => f.debug_tuple("AddEffect").field(&effect.kind()).finish(),
            FrameEndTask::RemoveEffect(id) => f.debug_tuple("RemoveEffect").field(id).finish(),
            FrameEndTask::ApplyDamage(request) => f.debug_tuple("ApplyDamage").field(request).finish(),
            FrameEndTask::SpawnActor { template, owner, position } => f
                .debug_struct("SpawnActor")
                .field("template", &template.name)
                .field("owner", owner)
                .field("position", position)
                .finish(),
            FrameEndTask::TintArea(tint) => f.debug_tuple("TintArea").field(tint).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// FIFO of frame-end tasks. Also remembers which effects have a removal
/// queued so the world can skip them for the rest of the tick.
#[derive(Debug, Default)]
pub struct FrameEndQueue {
    tasks: VecDeque<FrameEndTask>,
    pending_removals: AHashSet<EffectId>,
}

impl FrameEndQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: FrameEndTask) {
        if let FrameEndTask::RemoveEffect(id) = &task {
            self.pending_removals.insert(*id);
        }
        self.tasks.push_back(task);
    }

    pub(crate) fn pop(&mut self) -> Option<FrameEndTask> {
        let task = self.tasks.pop_front()?;
        if let FrameEndTask::RemoveEffect(id) = &task {
            self.pending_removals.remove(id);
        }
        Some(task)
    }

    pub fn is_removal_pending(&self, id: EffectId) -> bool {
        self.pending_removals.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
        self.pending_removals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = FrameEndQueue::new();
        queue.push(FrameEndTask::RemoveActor(ActorId(1)));
        queue.push(FrameEndTask::RemoveEffect(EffectId(5)));
        queue.push(FrameEndTask::RemoveActor(ActorId(2)));
        assert!(queue.is_removal_pending(EffectId(5)));
        assert!(matches!(queue.pop(), Some(FrameEndTask::RemoveActor(ActorId(1)))));
        assert!(matches!(queue.pop(), Some(FrameEndTask::RemoveEffect(EffectId(5)))));
        assert!(!queue.is_removal_pending(EffectId(5)));
        assert!(matches!(queue.pop(), Some(FrameEndTask::RemoveActor(ActorId(2)))));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_debug_names_callback() {
        let task = FrameEndTask::callback(|_| {});
        assert_eq!(format!("{task:?}"), "callback");
    }
}
