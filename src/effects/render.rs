//! Renderable primitives handed to the external renderer
//!
//! The renderer only ever reads these; nothing here points back into the
//! simulation.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::geometry::{WAngle, WDist, WPos};

/// RGBA color, deserialized from `[r, g, b, a]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha shifted by `delta`, clamped to `0..=255`
    pub fn shift_alpha(self, delta: i32) -> Color {
        Color {
            a: (self.a as i32 + delta).clamp(0, 255) as u8,
            ..self
        }
    }

    /// Blend between two colors, `t` out of `div`
    pub fn lerp(a: Color, b: Color, t: i32, div: i32) -> Color {
        let div = div.max(1);
        let mix = |x: u8, y: u8| (x as i32 + (y as i32 - x as i32) * t / div).clamp(0, 255) as u8;
        Color::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

impl From<[u8; 4]> for Color {
    fn from(c: [u8; 4]) -> Self {
        Color::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Cross-section of a beam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamRenderShape {
    #[default]
    Cylindrical,
    Flat,
}

/// One drawable primitive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Renderable {
    Sprite {
        image: String,
        sequence: String,
        palette: String,
        frame: u32,
        position: WPos,
        facing: WAngle,
        shadow: bool,
    },
    Line {
        start: WPos,
        end: WPos,
        width: WDist,
        color: Color,
    },
    Beam {
        start: WPos,
        end: WPos,
        width: WDist,
        shape: BeamRenderShape,
        color: Color,
    },
    /// Connected segments (helixes, zaps, contrails). Colors run from
    /// `start_color` at the first point to `end_color` at the last.
    Polyline {
        points: Vec<WPos>,
        width: WDist,
        start_color: Color,
        end_color: Color,
    },
    Tint {
        center: WPos,
        radius: WDist,
        color: Color,
    },
}

impl Renderable {
    /// Point the renderer depth-sorts by. Lines and beams use their midpoint,
    /// polylines their first point.
    pub fn anchor(&self) -> glam::Vec3 {
        match self {
            Renderable::Sprite { position, .. } => position.to_vec3(),
            Renderable::Line { start, end, .. } | Renderable::Beam { start, end, .. } => {
                start.to_vec3().lerp(end.to_vec3(), 0.5)
            }
            Renderable::Polyline { points, .. } => points.first().map(|p| p.to_vec3()).unwrap_or(glam::Vec3::ZERO),
            Renderable::Tint { center, .. } => center.to_vec3(),
        }
    }
}

/// What the local viewer is allowed to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fog {
    RevealAll,
    Revealed(AHashSet<(i32, i32)>),
}

/// Viewer state passed to `Effect::render` and used for feedback audibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub fog: Fog,
}

impl ViewerContext {
    pub fn reveal_all() -> Self {
        Self { fog: Fog::RevealAll }
    }

    pub fn with_revealed_cells(cells: impl IntoIterator<Item = (i32, i32)>) -> Self {
        Self {
            fog: Fog::Revealed(cells.into_iter().collect()),
        }
    }

    pub fn obscures(&self, pos: WPos) -> bool {
        match &self.fog {
            Fog::RevealAll => false,
            Fog::Revealed(cells) => !cells.contains(&pos.cell()),
        }
    }
}

impl Default for ViewerContext {
    fn default() -> Self {
        Self::reveal_all()
    }
}
