//! # Region Analysis
//!
//! Connected-component search over a boolean passability grid.
//!
//! Regions are 4-connected: diagonal neighbours never join two regions.

use crate::game::{Grid, Position};
use pathfinding::prelude::bfs_reach;
use std::collections::HashSet;

/// Row-major boolean view of which cells can be walked through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassabilityGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl PassabilityGrid {
    /// Creates a grid with no passable cell.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Builds a grid by evaluating `passable` at every position.
    pub fn from_fn(width: u32, height: u32, passable: impl Fn(Position) -> bool) -> Self {
        let mut grid = Self::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let pos = Position::new(x, y);
                grid.set(pos, passable(pos));
            }
        }
        grid
    }

    /// Floor kinds are passable, features are ignored.
    pub fn floors(grid: &Grid) -> Self {
        Self::from_fn(grid.width, grid.height, |pos| {
            grid.get(pos).map_or(false, |tile| tile.kind.is_floor())
        })
    }

    /// Floor kinds without a blocking feature are passable.
    pub fn walkable(grid: &Grid) -> Self {
        Self::from_fn(grid.width, grid.height, |pos| {
            grid.get(pos).map_or(false, |tile| tile.is_walkable())
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Out-of-bounds cells are never passable.
    pub fn is_passable(&self, pos: Position) -> bool {
        self.index(pos).map_or(false, |idx| self.cells[idx])
    }

    /// Sets a cell; out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, passable: bool) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx] = passable;
        }
    }

    /// Number of passable cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// Passable cells in row-major order.
    pub fn passable_positions(&self) -> Vec<Position> {
        let width = self.width as i32;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(|(idx, _)| Position::new(idx as i32 % width, idx as i32 / width))
            .collect()
    }
}

/// A maximal 4-connected set of passable cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// First cell of the region in row-major order
    pub anchor: Position,
    cells: HashSet<Position>,
}

impl Region {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    pub fn cells(&self) -> &HashSet<Position> {
        &self.cells
    }
}

/// Every cell reachable from `start` through 4-directional passable steps.
///
/// Empty when `start` itself is not passable.
pub fn flood_fill(passable: &PassabilityGrid, start: Position) -> HashSet<Position> {
    if !passable.is_passable(start) {
        return HashSet::new();
    }
    bfs_reach(start, |pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| passable.is_passable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Splits the passable cells into connected regions.
///
/// Regions come out in row-major order of their anchor cell.
///
/// # Examples
///
/// ```
/// use emberdeep::{find_connected_regions, PassabilityGrid, Position};
///
/// // Two islands separated by a wall column at x = 2
/// let grid = PassabilityGrid::from_fn(5, 3, |pos| pos.x != 2);
/// let regions = find_connected_regions(&grid);
/// assert_eq!(regions.len(), 2);
/// assert_eq!(regions[0].anchor, Position::new(0, 0));
/// assert_eq!(regions[1].anchor, Position::new(3, 0));
/// ```
pub fn find_connected_regions(passable: &PassabilityGrid) -> Vec<Region> {
    let mut seen = PassabilityGrid::new(passable.width(), passable.height());
    let mut regions = Vec::new();

    for anchor in passable.passable_positions() {
        if seen.is_passable(anchor) {
            continue;
        }
        let cells = flood_fill(passable, anchor);
        for pos in &cells {
            seen.set(*pos, true);
        }
        regions.push(Region { anchor, cells });
    }

    regions
}

/// The region with the most cells; ties go to the one found first.
pub fn largest_region(regions: &[Region]) -> Option<&Region> {
    regions.iter().fold(None, |best, region| match best {
        Some(current) if current.len() >= region.len() => Some(current),
        _ => Some(region),
    })
}

/// True when all passable cells form a single region (or there are none).
pub fn is_connected(passable: &PassabilityGrid) -> bool {
    match passable.passable_positions().first() {
        Some(start) => flood_fill(passable, *start).len() == passable.count(),
        None => true,
    }
}
