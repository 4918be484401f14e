//! Terrain target types per map cell

use ahash::AHashMap;

use crate::core::types::TargetTypes;
use crate::geometry::WPos;

/// Terrain type lookup. Cells without an override use the default type.
#[derive(Debug, Clone)]
pub struct TerrainLayer {
    default_type: String,
    overrides: AHashMap<(i32, i32), String>,
}

impl TerrainLayer {
    pub fn new(default_type: impl Into<String>) -> Self {
        Self {
            default_type: default_type.into(),
            overrides: AHashMap::new(),
        }
    }

    pub fn set_cell(&mut self, cell: (i32, i32), terrain: impl Into<String>) {
        self.overrides.insert(cell, terrain.into());
    }

    pub fn type_at(&self, pos: WPos) -> &str {
        self.overrides
            .get(&pos.cell())
            .map(String::as_str)
            .unwrap_or(&self.default_type)
    }

    /// Target types for a point impact on the ground
    pub fn target_types_at(&self, pos: WPos) -> TargetTypes {
        std::iter::once(self.type_at(pos).to_string()).collect()
    }
}

impl Default for TerrainLayer {
    fn default() -> Self {
        Self::new("Ground")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_cell() {
        let mut terrain = TerrainLayer::default();
        terrain.set_cell((2, 0), "Water");
        assert_eq!(terrain.type_at(WPos::new(100, 100, 0)), "Ground");
        assert_eq!(terrain.type_at(WPos::new(2100, 100, 0)), "Water");
        assert!(terrain.target_types_at(WPos::new(2100, 5, 0)).contains("Water"));
    }
}
