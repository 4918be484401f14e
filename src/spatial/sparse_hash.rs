//! Sparse hash grid for actor lookups by area

use ahash::AHashMap;

use crate::core::types::ActorId;
use crate::geometry::WPos;

/// Sparse hash grid bucketing actors by horizontal position.
///
/// Queries return candidates from every bucket overlapping the query box,
/// sorted by id. Exact distance checks are the caller's job.
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: i32,
    cells: AHashMap<(i32, i32), Vec<ActorId>>,
    locations: AHashMap<ActorId, (i32, i32)>,
}

impl SparseHashGrid {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cells: AHashMap::new(),
            locations: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.cell_size), y.div_euclid(self.cell_size))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.locations.clear();
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Inserts or moves an actor
    pub fn insert(&mut self, actor: ActorId, pos: WPos) {
        let coord = self.cell_coord(pos.x, pos.y);
        if let Some(old) = self.locations.insert(actor, coord) {
            if old == coord {
                return;
            }
            self.remove_from_cell(actor, old);
        }
        self.cells.entry(coord).or_default().push(actor);
    }

    pub fn remove(&mut self, actor: ActorId) {
        if let Some(coord) = self.locations.remove(&actor) {
            self.remove_from_cell(actor, coord);
        }
    }

    fn remove_from_cell(&mut self, actor: ActorId, coord: (i32, i32)) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&a| a != actor);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Candidates in every bucket overlapping the box `min..=max`
    pub fn query_box(&self, min: (i32, i32), max: (i32, i32)) -> Vec<ActorId> {
        let (x0, y0) = self.cell_coord(min.0, min.1);
        let (x1, y1) = self.cell_coord(max.0, max.1);
        let mut found: Vec<ActorId> = (x0..=x1)
            .flat_map(|cx| (y0..=y1).map(move |cy| (cx, cy)))
            .filter_map(|coord| self.cells.get(&coord))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable();
        found
    }

    /// Candidates within the square circumscribing a circle
    pub fn query_radius(&self, center: WPos, radius: i32) -> Vec<ActorId> {
        let r = radius.max(0);
        self.query_box(
            (center.x.saturating_sub(r), center.y.saturating_sub(r)),
            (center.x.saturating_add(r), center.y.saturating_add(r)),
        )
    }

    /// Candidates within the bounding box of a segment, padded by `pad`
    pub fn query_segment(&self, start: WPos, end: WPos, pad: i32) -> Vec<ActorId> {
        let pad = pad.max(0);
        self.query_box(
            (start.x.min(end.x).saturating_sub(pad), start.y.min(end.y).saturating_sub(pad)),
            (start.x.max(end.x).saturating_add(pad), start.y.max(end.y).saturating_add(pad)),
        )
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, actors: impl Iterator<Item = (ActorId, WPos)>) {
        self.clear();
        for (actor, pos) in actors {
            self.insert(actor, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_query() {
        let mut grid = SparseHashGrid::new(1024);
        grid.insert(ActorId(2), WPos::new(100, 100, 0));
        grid.insert(ActorId(1), WPos::new(900, 50, 0));
        grid.insert(ActorId(3), WPos::new(9000, 9000, 0));
        assert_eq!(grid.query_radius(WPos::new(500, 500, 0), 600), vec![ActorId(1), ActorId(2)]);
    }

    #[test]
    fn test_move_between_cells() {
        let mut grid = SparseHashGrid::new(1024);
        grid.insert(ActorId(1), WPos::new(0, 0, 0));
        grid.insert(ActorId(1), WPos::new(5000, 0, 0));
        assert!(grid.query_radius(WPos::new(0, 0, 0), 100).is_empty());
        assert_eq!(grid.query_radius(WPos::new(5000, 0, 0), 100), vec![ActorId(1)]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut grid = SparseHashGrid::new(512);
        grid.insert(ActorId(4), WPos::new(-10, -10, 0));
        grid.remove(ActorId(4));
        assert!(grid.is_empty());
        assert!(grid.query_radius(WPos::new(0, 0, 0), 2048).is_empty());
    }

    #[test]
    fn test_segment_query_covers_diagonal() {
        let mut grid = SparseHashGrid::new(1024);
        grid.insert(ActorId(1), WPos::new(3000, 3000, 0));
        let found = grid.query_segment(WPos::new(0, 0, 0), WPos::new(6000, 6000, 0), 0);
        assert_eq!(found, vec![ActorId(1)]);
    }
}
