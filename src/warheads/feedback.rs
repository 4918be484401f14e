//! Presentation warheads: explosions, sounds, tints and screen effects

use serde::Deserialize;

use super::WarheadArgs;
use crate::effects::{Color, SpriteConfig, SpriteEffect, TickContext};
use crate::geometry::WDist;
use crate::world::{AreaTint, FrameEndTask};

fn always() -> i32 {
    100
}

/// Explosion animation plus an impact sound
#[derive(Debug, Clone, Deserialize)]
pub struct ExplosionWarhead {
    #[serde(default)]
    pub sprite: Option<SpriteConfig>,
    #[serde(default)]
    pub impact_sounds: Vec<String>,
    /// Percent chance of playing a sound, rolled on the cosmetic stream
    #[serde(default = "always")]
    pub impact_sound_chance: i32,
}

impl ExplosionWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, args: &WarheadArgs) {
        let pos = args.impact_position;
        if let Some(sprite) = &self.sprite {
            let effect = SpriteEffect::new(sprite, pos, args.impact_facing, ctx.cosmetic_random());
            ctx.add_effect(effect);
        }

        if self.impact_sounds.is_empty() {
            return;
        }
        let random = ctx.cosmetic_random();
        if random.next_range(0, 100) >= self.impact_sound_chance {
            return;
        }
        let sound = random.pick(&self.impact_sounds).cloned();
        if let Some(sound) = sound {
            ctx.add_frame_end_task(FrameEndTask::PlaySound { sound, position: pos });
        }
    }
}

/// Timed colored overlay over an area
#[derive(Debug, Clone, Deserialize)]
pub struct TintWarhead {
    pub color: Color,
    pub radius: WDist,
    pub duration: u32,
}

impl TintWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, args: &WarheadArgs) {
        ctx.add_frame_end_task(FrameEndTask::TintArea(AreaTint {
            center: args.impact_position,
            radius: self.radius,
            color: self.color,
            duration: self.duration,
        }));
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShakeWarhead {
    pub intensity: i32,
    pub duration: u32,
}

impl ShakeWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>, args: &WarheadArgs) {
        ctx.add_frame_end_task(FrameEndTask::ShakeScreen {
            position: args.impact_position,
            intensity: self.intensity,
            duration: self.duration,
        });
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlashWarhead {
    #[serde(default = "white")]
    pub color: Color,
    pub duration: u32,
}

fn white() -> Color {
    Color::WHITE
}

impl FlashWarhead {
    pub(crate) fn impact(&self, ctx: &mut TickContext<'_>) {
        ctx.add_frame_end_task(FrameEndTask::FlashScreen {
            color: self.color,
            duration: self.duration,
        });
    }
}
