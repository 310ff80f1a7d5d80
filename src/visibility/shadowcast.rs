//! # Shadowcasting
//!
//! Symmetric shadowcasting over four quadrants with exact rational slopes.
//!
//! Tiles are classified by a transparency in `[0, 1]`: `0` blocks sight,
//! `1` is open, anything between lets light through dimmed. A row is split
//! into runs of equal transparency; each see-through run spawns the scan of
//! the next row over its own slope window with the transmittance multiplied
//! by the run's transparency. Opaque tiles are revealed but cast nothing.

use crate::game::{Grid, Position, Tile};
use crate::{EmberError, EmberResult};
use std::collections::HashMap;

/// Below this transmittance a branch stops scanning.
const MIN_TRANSMITTANCE: f32 = 0.01;

/// Computes which tiles are visible from `origin` within `radius`.
///
/// Returns the transmittance (`0..=1`) reaching every visible tile; the
/// origin is always fully visible. Out-of-grid cells count as opaque and are
/// never reported.
///
/// # Examples
///
/// ```
/// use emberdeep::{compute_visibility, Grid, Position, Tile};
///
/// let mut grid = Grid::new(9, 9);
/// for pos in grid.positions().collect::<Vec<_>>() {
///     if pos.x > 0 && pos.y > 0 && pos.x < 8 && pos.y < 8 {
///         grid.set_tile(pos, Tile::floor()).unwrap();
///     }
/// }
/// let lit = compute_visibility(&grid, Position::new(4, 4), 3, |tile| {
///     if tile.kind.is_wall() { 0.0 } else { 1.0 }
/// })
/// .unwrap();
/// assert_eq!(lit.get(&Position::new(4, 4)), Some(&1.0));
/// assert_eq!(lit.get(&Position::new(6, 4)), Some(&1.0));
/// assert!(!lit.contains_key(&Position::new(8, 8)));
/// ```
pub fn compute_visibility<F>(
    grid: &Grid,
    origin: Position,
    radius: i32,
    transparency: F,
) -> EmberResult<HashMap<Position, f32>>
where
    F: Fn(&Tile) -> f32,
{
    if radius <= 0 {
        return Err(EmberError::Config(format!(
            "visibility radius must be positive, got {}",
            radius
        )));
    }

    let mut lit = HashMap::new();
    if !grid.in_bounds(origin) {
        return Ok(lit);
    }
    lit.insert(origin, 1.0);

    for quadrant in Quadrant::ALL {
        let mut caster = Caster {
            grid,
            origin,
            radius: i64::from(radius),
            quadrant,
            transparency: &transparency,
            lit: &mut lit,
        };
        caster.scan(1, Slope::new(-1, 1), Slope::new(1, 1), 1.0);
    }

    Ok(lit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    North,
    East,
    South,
    West,
}

impl Quadrant {
    const ALL: [Quadrant; 4] = [
        Quadrant::North,
        Quadrant::East,
        Quadrant::South,
        Quadrant::West,
    ];

    /// Maps quadrant-local (depth, column) to grid coordinates.
    fn transform(self, origin: Position, depth: i64, col: i64) -> Position {
        let (depth, col) = (depth as i32, col as i32);
        match self {
            Quadrant::North => Position::new(origin.x + col, origin.y - depth),
            Quadrant::South => Position::new(origin.x + col, origin.y + depth),
            Quadrant::East => Position::new(origin.x + depth, origin.y + col),
            Quadrant::West => Position::new(origin.x - depth, origin.y + col),
        }
    }
}

/// Exact slope `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Slope of the left edge of the tile at `col` in row `depth`.
    fn of_tile(depth: i64, col: i64) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }

    /// `depth * slope` rounded to the nearest integer, halves rounding up.
    fn round_ties_up(self, depth: i64) -> i64 {
        (2 * depth * self.num + self.den).div_euclid(2 * self.den)
    }

    /// `depth * slope` rounded to the nearest integer, halves rounding down.
    fn round_ties_down(self, depth: i64) -> i64 {
        -(self.den - 2 * depth * self.num).div_euclid(2 * self.den)
    }

    /// `col >= depth * slope`
    fn at_or_below(self, depth: i64, col: i64) -> bool {
        col * self.den >= depth * self.num
    }

    /// `col <= depth * slope`
    fn at_or_above(self, depth: i64, col: i64) -> bool {
        col * self.den <= depth * self.num
    }
}

struct Caster<'a, F> {
    grid: &'a Grid,
    origin: Position,
    radius: i64,
    quadrant: Quadrant,
    transparency: &'a F,
    lit: &'a mut HashMap<Position, f32>,
}

impl<F> Caster<'_, F>
where
    F: Fn(&Tile) -> f32,
{
    fn transparency_at(&self, pos: Position) -> f32 {
        self.grid
            .get(pos)
            .map(|tile| (self.transparency)(tile).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    fn reveal(&mut self, pos: Position, transmittance: f32) {
        let entry = self.lit.entry(pos).or_insert(0.0);
        *entry = entry.max(transmittance);
    }

    fn scan(&mut self, depth: i64, mut start: Slope, end: Slope, transmittance: f32) {
        if depth > self.radius || transmittance < MIN_TRANSMITTANCE {
            return;
        }

        let min_col = start.round_ties_up(depth);
        let max_col = end.round_ties_down(depth);
        let mut prev: Option<f32> = None;

        for col in min_col..=max_col {
            let pos = self.quadrant.transform(self.origin, depth, col);
            let here = self.transparency_at(pos);

            let in_radius = depth * depth + col * col <= self.radius * self.radius;
            let symmetric = start.at_or_below(depth, col) && end.at_or_above(depth, col);
            if in_radius && self.grid.in_bounds(pos) && (here == 0.0 || symmetric) {
                self.reveal(pos, transmittance);
            }

            if let Some(before) = prev {
                if before != here {
                    let edge = Slope::of_tile(depth, col);
                    if before > 0.0 {
                        self.scan(depth + 1, start, edge, transmittance * before);
                    }
                    if here > 0.0 {
                        start = edge;
                    }
                }
            }
            prev = Some(here);
        }

        if let Some(last) = prev {
            if last > 0.0 {
                self.scan(depth + 1, start, end, transmittance * last);
            }
        }
    }
}
