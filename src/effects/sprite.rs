//! Sprite animations and smoke trails

use serde::{Deserialize, Serialize};

use super::render::{Renderable, ViewerContext};
use super::{Effect, TickContext};
use crate::core::random::CosmeticRandom;
use crate::geometry::{WAngle, WPos};

fn default_sequences() -> Vec<String> {
    vec!["idle".to_string()]
}

fn default_palette() -> String {
    "effect".to_string()
}

fn default_frames() -> u32 {
    8
}

fn default_trail_interval() -> u32 {
    2
}

fn default_trail_delay() -> u32 {
    1
}

/// Image used to draw a projectile body or a one-shot animation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteConfig {
    pub image: String,
    #[serde(default = "default_sequences")]
    pub sequences: Vec<String>,
    #[serde(default = "default_palette")]
    pub palette: String,
    /// Animation length for one-shot sprites
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default)]
    pub shadow: bool,
}

impl SpriteConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            sequences: default_sequences(),
            palette: default_palette(),
            frames: default_frames(),
            shadow: false,
        }
    }
}

/// Puffs left behind by a moving projectile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailConfig {
    #[serde(flatten)]
    pub sprite: SpriteConfig,
    /// Ticks between puffs
    #[serde(default = "default_trail_interval")]
    pub interval: u32,
    /// Ticks after launch before the first puff
    #[serde(default = "default_trail_delay")]
    pub delay: u32,
}

/// One-shot animation that removes itself after its last frame
#[derive(Debug, Clone)]
pub struct SpriteEffect {
    image: String,
    sequence: String,
    palette: String,
    position: WPos,
    facing: WAngle,
    frames: u32,
    frame: u32,
}

impl SpriteEffect {
    pub fn new(config: &SpriteConfig, position: WPos, facing: WAngle, random: &mut CosmeticRandom) -> Self {
        let sequence = random
            .pick(&config.sequences)
            .cloned()
            .unwrap_or_else(|| "idle".to_string());
        Self {
            image: config.image.clone(),
            sequence,
            palette: config.palette.clone(),
            position,
            facing,
            frames: config.frames.max(1),
            frame: 0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl Effect for SpriteEffect {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.frame += 1;
        if self.frame >= self.frames {
            ctx.remove_self();
        }
    }

    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        if viewer.obscures(self.position) {
            return Box::new(std::iter::empty());
        }
        Box::new(std::iter::once(Renderable::Sprite {
            image: self.image.clone(),
            sequence: self.sequence.clone(),
            palette: self.palette.clone(),
            frame: self.frame,
            position: self.position,
            facing: self.facing,
            shadow: false,
        }))
    }

    fn kind(&self) -> &'static str {
        "sprite"
    }
}

/// Counts down the trail interval for a projectile and spawns puffs
#[derive(Debug, Clone)]
pub struct TrailEmitter {
    config: TrailConfig,
    countdown: i64,
}

impl TrailEmitter {
    pub fn new(config: TrailConfig) -> Self {
        let countdown = config.delay as i64;
        Self { config, countdown }
    }

    /// Call once per tick with the position the puff should appear at
    pub fn tick(&mut self, ctx: &mut TickContext<'_>, position: WPos, facing: WAngle) {
        self.countdown -= 1;
        if self.countdown < 0 {
            let puff = SpriteEffect::new(&self.config.sprite, position, facing, ctx.cosmetic_random());
            ctx.add_effect(puff);
            self.countdown = self.config.interval as i64;
        }
    }
}

/// Renders a projectile body sprite
pub(crate) fn body_sprite(
    config: &SpriteConfig,
    sequence: &str,
    position: WPos,
    facing: WAngle,
    frame: u32,
) -> Renderable {
    Renderable::Sprite {
        image: config.image.clone(),
        sequence: sequence.to_string(),
        palette: config.palette.clone(),
        frame,
        position,
        facing,
        shadow: config.shadow,
    }
}
