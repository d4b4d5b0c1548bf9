//! Toroidal grid geometry
//!
//! Cells are integer coordinates on a `width x height` plane whose edges
//! connect to the opposite edges. Everything here is pure.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Cardinal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Enumeration order used for tie-breaks
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in grid coordinates (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Grid dimensions with wrap-around arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self { width, height }
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Wrap any coordinate onto the torus
    #[inline]
    pub fn wrap(&self, cell: IVec2) -> IVec2 {
        IVec2::new(cell.x.rem_euclid(self.width), cell.y.rem_euclid(self.height))
    }

    /// Move `steps` cells in `dir`, wrapping on both axes
    #[inline]
    pub fn step(&self, cell: IVec2, dir: Direction, steps: i32) -> IVec2 {
        self.wrap(cell + dir.delta() * steps)
    }

    /// Squared distance using the shorter way around each axis
    pub fn toroidal_distance_sq(&self, a: IVec2, b: IVec2) -> i64 {
        let dx = (a.x - b.x).rem_euclid(self.width);
        let dy = (a.y - b.y).rem_euclid(self.height);
        let dx = dx.min(self.width - dx) as i64;
        let dy = dy.min(self.height - dy) as i64;
        dx * dx + dy * dy
    }

    /// Squared distance from `b` forward to `a`, wrapping each axis
    ///
    /// Not symmetric: a cell one step behind `b` counts as almost a full lap
    /// away. Fleeing food ranks its moves with this.
    pub fn forward_distance_sq(&self, a: IVec2, b: IVec2) -> i64 {
        let dx = (a.x - b.x).rem_euclid(self.width) as i64;
        let dy = (a.y - b.y).rem_euclid(self.height) as i64;
        dx * dx + dy * dy
    }

    /// Cell at the middle of the grid
    pub fn center(&self) -> IVec2 {
        IVec2::new(self.width / 2, self.height / 2)
    }

    /// Cell for a linear index in row-major order
    pub fn cell_at(&self, index: usize) -> IVec2 {
        let w = self.width as usize;
        IVec2::new((index % w) as i32, (index / w) as i32)
    }

    /// Cross-shaped blast: origin plus `radius` cells along each cardinal axis
    ///
    /// Always yields `4 * radius + 1` entries; on small grids wrapped cells may
    /// repeat.
    pub fn blast_pattern(&self, origin: IVec2, radius: u32) -> Vec<IVec2> {
        let mut cells = Vec::with_capacity(4 * radius as usize + 1);
        cells.push(self.wrap(origin));
        for i in 1..=radius as i32 {
            cells.push(self.step(origin, Direction::Right, i));
            cells.push(self.step(origin, Direction::Left, i));
            cells.push(self.step(origin, Direction::Down, i));
            cells.push(self.step(origin, Direction::Up, i));
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap_negative() {
        let grid = Grid::new(10, 8);
        assert_eq!(grid.wrap(IVec2::new(-1, -1)), IVec2::new(9, 7));
        assert_eq!(grid.wrap(IVec2::new(10, 8)), IVec2::ZERO);
    }

    #[test]
    fn test_step_wraps_edges() {
        let grid = Grid::new(10, 10);
        assert_eq!(grid.step(IVec2::new(0, 5), Direction::Left, 1), IVec2::new(9, 5));
        assert_eq!(grid.step(IVec2::new(5, 9), Direction::Down, 1), IVec2::new(5, 0));
    }

    #[test]
    fn test_toroidal_distance_uses_short_way() {
        let grid = Grid::new(10, 10);
        assert_eq!(grid.toroidal_distance_sq(IVec2::new(0, 0), IVec2::new(9, 0)), 1);
        assert_eq!(grid.toroidal_distance_sq(IVec2::new(0, 0), IVec2::new(5, 5)), 50);
    }

    #[test]
    fn test_forward_distance_wraps_one_way() {
        let grid = Grid::new(10, 10);
        assert_eq!(grid.forward_distance_sq(IVec2::new(9, 0), IVec2::new(0, 0)), 81);
        assert_eq!(grid.forward_distance_sq(IVec2::new(0, 0), IVec2::new(9, 0)), 1);
        assert_eq!(grid.forward_distance_sq(IVec2::new(5, 4), IVec2::new(4, 5)), 82);
    }

    #[test]
    fn test_blast_pattern_radius_two_at_corner() {
        let grid = Grid::new(10, 10);
        let cells = grid.blast_pattern(IVec2::new(0, 0), 2);
        assert_eq!(cells.len(), 9);
        for expected in [
            IVec2::new(0, 0),
            IVec2::new(1, 0),
            IVec2::new(2, 0),
            IVec2::new(9, 0),
            IVec2::new(8, 0),
            IVec2::new(0, 1),
            IVec2::new(0, 2),
            IVec2::new(0, 9),
            IVec2::new(0, 8),
        ] {
            assert!(cells.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_opposite() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.delta() + dir.opposite().delta(), IVec2::ZERO);
        }
    }

    proptest! {
        #[test]
        fn prop_blast_pattern_size_and_bounds(
            w in 1i32..40, h in 1i32..40, x in -50i32..50, y in -50i32..50, r in 0u32..8
        ) {
            let grid = Grid::new(w, h);
            let cells = grid.blast_pattern(IVec2::new(x, y), r);
            prop_assert_eq!(cells.len(), 4 * r as usize + 1);
            for c in cells {
                prop_assert!(c.x >= 0 && c.x < w && c.y >= 0 && c.y < h);
            }
        }
    }
}
