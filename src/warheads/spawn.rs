//! Warheads that put new things into the world

use serde::Deserialize;
use tracing::{debug, warn};

use super::WarheadArgs;
use crate::effects::TickContext;
use crate::geometry::{WAngle, WDist, WVec};
use crate::projectiles::ShotArgs;
use crate::rules::{DefError, WeaponId};
use crate::world::{ActorTemplate, FrameEndTask};

fn default_cluster_count() -> u32 {
    8
}

fn default_cluster_range() -> WDist {
    WDist(1024)
}

/// Declared form of [`FireClusterWarhead`], naming its weapon
#[derive(Debug, Clone, Deserialize)]
pub struct FireClusterDef {
    pub weapon: String,
    #[serde(default = "default_cluster_count")]
    pub count: u32,
    #[serde(default = "default_cluster_range")]
    pub range: WDist,
    #[serde(default)]
    pub random_rotation: bool,
}

impl FireClusterDef {
    pub fn freeze(self, resolve: impl Fn(&str) -> Option<WeaponId>) -> Result<FireClusterWarhead, DefError> {
        let weapon = resolve(&self.weapon).ok_or(DefError::UnknownWeapon(self.weapon))?;
        if self.count == 0 {
            return Err(DefError::invalid("count", "must be at least 1"));
        }
        Ok(FireClusterWarhead {
            weapon,
            count: self.count,
            range: self.range,
            random_rotation: self.random_rotation,
        })
    }
}

/// Fires `count` shots of another weapon from the impact point at targets
/// spaced evenly on a ring of radius `range`
#[derive(Debug, Clone)]
pub struct FireClusterWarhead {
    pub weapon: WeaponId,
    pub count: u32,
    pub range: WDist,
    pub random_rotation: bool,
}

impl FireClusterWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, args: &WarheadArgs) {
        let Some(weapon) = ctx.state().rules().get(self.weapon).cloned() else {
            warn!(weapon = %self.weapon, "Cluster weapon missing from rules");
            return;
        };
        let start = if self.random_rotation {
            WAngle::new(ctx.shared_random().next_below(1024))
        } else {
            args.impact_facing
        };

        debug!(parent = %args.weapon.name, cluster = %weapon.name, count = self.count, "Firing cluster");
        let ground = args.impact_position.with_z(0);
        for i in 0..self.count {
            let yaw = start + WAngle::new((1024 * i / self.count) as i32);
            let target = ground + WVec::from_yaw(yaw, self.range.0);
            ctx.launch(ShotArgs::from_warhead(weapon.clone(), args, target));
        }
    }
}

/// Spawns an actor owned by the firer's owner at the impact point
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnActorWarhead {
    pub actor: ActorTemplate,
}

impl SpawnActorWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, args: &WarheadArgs) {
        ctx.add_frame_end_task(FrameEndTask::SpawnActor {
            template: self.actor.clone(),
            owner: args.owner,
            position: args.impact_position.with_z(0),
        });
    }
}
