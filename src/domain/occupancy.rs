// Row-bitmap occupancy grid for collision-free block placement
use super::block::GridPosition;
use super::layout::{MAX_COLUMNS, MAX_ROWS};

/// Cells covered by a set of blocks, one bit per column, one mask per row.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cols: u32,
    rows: Vec<u64>,
}

impl OccupancyGrid {
    pub fn new(cols: u32) -> Self {
        Self {
            cols: cols.clamp(1, MAX_COLUMNS),
            rows: Vec::new(),
        }
    }

    pub fn from_positions<'a>(cols: u32, positions: impl IntoIterator<Item = &'a GridPosition>) -> Self {
        let mut grid = Self::new(cols);
        for position in positions {
            grid.occupy(position);
        }
        grid
    }

    fn mask(&self, x: u32, w: u32) -> u64 {
        let x = x.min(self.cols);
        let w = w.min(self.cols - x);
        if w == 0 {
            return 0;
        }
        let bits = if w >= 64 { u64::MAX } else { (1u64 << w) - 1 };
        bits << x
    }

    /// Marks the cells of `position`. Rows past `MAX_ROWS` are never stored.
    pub fn occupy(&mut self, position: &GridPosition) {
        let mask = self.mask(position.x, position.w);
        let top = position.y.min(MAX_ROWS) as usize;
        let bottom = position.bottom().min(MAX_ROWS) as usize;
        if self.rows.len() < bottom {
            self.rows.resize(bottom, 0);
        }
        for row in &mut self.rows[top..bottom] {
            *row |= mask;
        }
    }

    pub fn is_free(&self, position: &GridPosition) -> bool {
        let mask = self.mask(position.x, position.w);
        let top = position.y as usize;
        let bottom = (position.bottom() as usize).min(self.rows.len());
        (top..bottom).all(|r| self.rows[r] & mask == 0)
    }

    /// First `y` at or below `position.y` where the rectangle fits without
    /// crossing `MAX_ROWS`.
    pub fn first_free_y(&self, position: &GridPosition) -> Option<u32> {
        let mut candidate = *position;
        while candidate.bottom() <= MAX_ROWS {
            if self.is_free(&candidate) {
                return Some(candidate.y);
            }
            candidate.y += 1;
        }
        None
    }

    /// Clamps `position` into the grid and moves it down until it no longer
    /// collides with anything already occupied. `None` when no rows are left.
    pub fn place(&self, position: GridPosition) -> Option<GridPosition> {
        let clamped = position.clamped(self.cols);
        let y = self.first_free_y(&clamped)?;
        Some(GridPosition { y, ..clamped })
    }
}
