use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Position of a cell in the logical grid. Identity is purely positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub col: usize,
    pub row: usize,
}

impl CellCoord {
    /// Integer pair reported for "no cell" by hosts that want a plain pair.
    pub const SENTINEL_XY: (i64, i64) = (-1, -1);

    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    pub fn manhattan(self, other: CellCoord) -> usize {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }
}

/// Square grid topology: size, walls and the two terminal cells.
///
/// Hosts must not edit a grid while a search over it is running; the search
/// thread works on its own `Arc<Grid>` clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    walls: BTreeSet<CellCoord>,
    start: Option<CellCoord>,
    goal: Option<CellCoord>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            walls: BTreeSet::new(),
            start: None,
            goal: None,
        }
    }

    /// Grid with start in the top-left and goal in the bottom-right corner.
    pub fn with_corners(size: usize) -> Self {
        let mut grid = Self::new(size);
        if size > 0 {
            grid.start = Some(CellCoord::new(0, 0));
            grid.goal = Some(CellCoord::new(size - 1, size - 1));
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Option<CellCoord> {
        self.start
    }

    pub fn goal(&self) -> Option<CellCoord> {
        self.goal
    }

    pub fn walls(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.walls.iter().copied()
    }

    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.walls.contains(&cell)
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        let size = self.size as i64;
        x >= 0 && y >= 0 && x < size && y < size
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.col < self.size && cell.row < self.size
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| CellCoord::new(col, row)))
    }

    /// Passable 4-connected neighbours of `cell`.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        const DELTAS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
        DELTAS.iter().filter_map(move |(dx, dy)| {
            let x = cell.col as i64 + dx;
            let y = cell.row as i64 + dy;
            if !self.in_bounds(x, y) {
                return None;
            }
            let next = CellCoord::new(x as usize, y as usize);
            (!self.is_wall(next)).then_some(next)
        })
    }

    /// Marks `cell` as a wall. Terminal cells and out-of-bounds cells are
    /// rejected.
    pub fn set_wall(&mut self, cell: CellCoord, wall: bool) -> bool {
        if !self.contains(cell) || Some(cell) == self.start || Some(cell) == self.goal {
            return false;
        }
        if wall {
            self.walls.insert(cell)
        } else {
            self.walls.remove(&cell)
        }
    }

    pub fn toggle_wall(&mut self, cell: CellCoord) -> bool {
        let wall = !self.is_wall(cell);
        self.set_wall(cell, wall)
    }

    pub fn clear_walls(&mut self) {
        self.walls.clear();
    }

    pub fn set_start(&mut self, cell: CellCoord) -> bool {
        if !self.contains(cell) || Some(cell) == self.goal {
            return false;
        }
        self.walls.remove(&cell);
        self.start = Some(cell);
        true
    }

    pub fn set_goal(&mut self, cell: CellCoord) -> bool {
        if !self.contains(cell) || Some(cell) == self.start {
            return false;
        }
        self.walls.remove(&cell);
        self.goal = Some(cell);
        true
    }
}
