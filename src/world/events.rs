//! Gameplay-visible events produced while flushing frame-end tasks

use serde::Serialize;

use crate::core::types::{ActorId, EffectId, PlayerId, Tick};
use crate::effects::Color;
use crate::geometry::{WDist, WPos};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum SimEvent {
    ActorDamaged {
        tick: Tick,
        actor: ActorId,
        attacker: ActorId,
        amount: i32,
        remaining_hp: i32,
        damage_types: Vec<String>,
    },
    ActorKilled {
        tick: Tick,
        actor: ActorId,
        attacker: ActorId,
    },
    ActorSpawned {
        tick: Tick,
        actor: ActorId,
        template: String,
        owner: PlayerId,
    },
    ActorRemoved {
        tick: Tick,
        actor: ActorId,
    },
    OwnerChanged {
        tick: Tick,
        actor: ActorId,
        old_owner: PlayerId,
        new_owner: PlayerId,
    },
    ConditionGranted {
        tick: Tick,
        actor: ActorId,
        condition: String,
        duration: Option<u32>,
    },
    ConditionExpired {
        tick: Tick,
        actor: ActorId,
        condition: String,
    },
    EffectRemoved {
        tick: Tick,
        effect: EffectId,
        kind: &'static str,
    },
    SoundPlayed {
        tick: Tick,
        sound: String,
        position: WPos,
    },
    ScreenShake {
        tick: Tick,
        position: WPos,
        intensity: i32,
        duration: u32,
    },
    ScreenFlash {
        tick: Tick,
        color: Color,
        duration: u32,
    },
    AreaTinted {
        tick: Tick,
        center: WPos,
        radius: WDist,
    },
}

/// Append-only per-tick event buffer
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Takes everything logged so far
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
