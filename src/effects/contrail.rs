//! Contrails: a fixed-length history of projectile positions

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::render::{Color, Renderable, ViewerContext};
use super::{Effect, TickContext};
use crate::geometry::{WDist, WPos};

fn default_length() -> usize {
    20
}

fn default_width() -> WDist {
    WDist(64)
}

fn default_fade() -> Color {
    Color::rgba(255, 255, 255, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContrailConfig {
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_width")]
    pub width: WDist,
    #[serde(default)]
    pub color: Color,
    /// Color at the tail end
    #[serde(default = "default_fade")]
    pub fade_color: Color,
}

impl Default for ContrailConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            width: default_width(),
            color: Color::default(),
            fade_color: default_fade(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Contrail {
    config: ContrailConfig,
    points: VecDeque<WPos>,
}

impl Contrail {
    pub fn new(config: ContrailConfig) -> Self {
        Self {
            points: VecDeque::with_capacity(config.length + 1),
            config,
        }
    }

    /// Appends the newest position, dropping the oldest beyond the configured length
    pub fn update(&mut self, pos: WPos) {
        self.points.push_back(pos);
        while self.points.len() > self.config.length.max(1) {
            self.points.pop_front();
        }
    }

    /// Drops the oldest point; used while fading out
    pub fn shrink(&mut self) {
        self.points.pop_front();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn render(&self, viewer: &ViewerContext) -> Option<Renderable> {
        if self.points.len() < 2 || self.points.iter().all(|p| viewer.obscures(*p)) {
            return None;
        }
        Some(Renderable::Polyline {
            points: self.points.iter().copied().collect(),
            width: self.config.width,
            start_color: self.config.fade_color,
            end_color: self.config.color,
        })
    }
}

/// Keeps a contrail on screen after its projectile is gone, shortening it
/// by one point per tick.
#[derive(Debug, Clone)]
pub struct ContrailFader {
    contrail: Contrail,
}

impl ContrailFader {
    pub fn new(contrail: Contrail) -> Self {
        Self { contrail }
    }
}

impl Effect for ContrailFader {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.contrail.shrink();
        if self.contrail.is_empty() {
            ctx.remove_self();
        }
    }

    fn render<'a>(&'a self, viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        Box::new(self.contrail.render(viewer).into_iter())
    }

    fn kind(&self) -> &'static str {
        "contrail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrail_keeps_last_points() {
        let mut contrail = Contrail::new(ContrailConfig {
            length: 3,
            ..Default::default()
        });
        for x in 0..5 {
            contrail.update(WPos::new(x * 100, 0, 0));
        }
        assert_eq!(contrail.len(), 3);
        match contrail.render(&ViewerContext::reveal_all()) {
            Some(Renderable::Polyline { points, .. }) => {
                assert_eq!(points.first(), Some(&WPos::new(200, 0, 0)));
                assert_eq!(points.last(), Some(&WPos::new(400, 0, 0)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_single_point_is_not_drawn() {
        let mut contrail = Contrail::new(ContrailConfig::default());
        contrail.update(WPos::ZERO);
        assert!(contrail.render(&ViewerContext::reveal_all()).is_none());
    }
}
