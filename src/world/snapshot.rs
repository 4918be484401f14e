//! Sync snapshots
//!
//! Two replicas fed the same commands must produce identical snapshots
//! every tick. Comparing serialized snapshots is the desync check.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::types::{ActorId, EffectId, PlayerId, Tick};
use crate::effects::EffectState;
use crate::geometry::WPos;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub owner: PlayerId,
    pub position: WPos,
    pub hp: Option<i32>,
    pub conditions: BTreeMap<String, Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSnapshot {
    pub id: EffectId,
    pub kind: &'static str,
    pub state: EffectState,
    pub position: Option<WPos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub actors: Vec<ActorSnapshot>,
    pub effects: Vec<EffectSnapshot>,
    pub shared_random_draws: u64,
}

impl WorldSnapshot {
    /// Canonical byte form used for replay comparison
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
