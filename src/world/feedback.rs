//! Screen feedback and area tint layers
//!
//! These hold the local, presentation-side state requested by warheads.
//! They are written during frame-end flush and decay once per tick.

use serde::Serialize;

use crate::core::types::Tick;
use crate::effects::{Color, Renderable, ViewerContext};
use crate::geometry::{WDist, WPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AreaTint {
    pub center: WPos,
    pub radius: WDist,
    pub color: Color,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveShake {
    pub position: WPos,
    pub intensity: i32,
    pub until: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveFlash {
    pub color: Color,
    pub until: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTint {
    tint: AreaTint,
    until: Tick,
}

#[derive(Debug, Default)]
pub struct FeedbackLayers {
    shakes: Vec<ActiveShake>,
    flash: Option<ActiveFlash>,
    tints: Vec<ActiveTint>,
}

impl FeedbackLayers {
    pub fn add_shake(&mut self, now: Tick, position: WPos, intensity: i32, duration: u32) {
        self.shakes.push(ActiveShake {
            position,
            intensity,
            until: now + duration as u64,
        });
    }

    pub fn add_flash(&mut self, now: Tick, color: Color, duration: u32) {
        self.flash = Some(ActiveFlash {
            color,
            until: now + duration as u64,
        });
    }

    pub fn add_tint(&mut self, now: Tick, tint: AreaTint) {
        self.tints.push(ActiveTint {
            tint,
            until: now + tint.duration as u64,
        });
    }

    /// Drops everything that has run its course by `now`
    pub fn expire(&mut self, now: Tick) {
        self.shakes.retain(|s| s.until > now);
        self.tints.retain(|t| t.until > now);
        if self.flash.map_or(false, |f| f.until <= now) {
            self.flash = None;
        }
    }

    /// Summed intensity of the shakes currently running
    pub fn shake_intensity(&self) -> i32 {
        self.shakes.iter().map(|s| s.intensity).sum()
    }

    pub fn flash(&self) -> Option<ActiveFlash> {
        self.flash
    }

    pub fn tint_count(&self) -> usize {
        self.tints.len()
    }

    pub fn render<'a>(&'a self, viewer: &'a ViewerContext) -> impl Iterator<Item = Renderable> + 'a {
        self.tints
            .iter()
            .filter(move |t| !viewer.obscures(t.tint.center))
            .map(|t| Renderable::Tint {
                center: t.tint.center,
                radius: t.tint.radius,
                color: t.tint.color,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_expire() {
        let mut layers = FeedbackLayers::default();
        layers.add_shake(10, WPos::ZERO, 5, 3);
        layers.add_tint(
            10,
            AreaTint {
                center: WPos::ZERO,
                radius: WDist(1024),
                color: Color::RED,
                duration: 1,
            },
        );
        layers.add_flash(10, Color::WHITE, 2);
        layers.expire(11);
        assert_eq!(layers.shake_intensity(), 5);
        assert_eq!(layers.tint_count(), 0);
        assert!(layers.flash().is_some());
        layers.expire(13);
        assert_eq!(layers.shake_intensity(), 0);
        assert!(layers.flash().is_none());
    }
}
