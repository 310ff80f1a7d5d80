//! # World Representation
//!
//! Tiles, the per-depth grid and the level that owns it.

use crate::game::Position;
use crate::visibility::LightSource;
use crate::{EmberError, EmberResult};
use serde::{Deserialize, Serialize};

/// Base terrain of a tile.
///
/// Wall variants are impassable and block vision, floor variants are open.
/// The variant within each family is purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    EarthWall,
    MossyWall,
    StoneWall,
    ObsidianWall,
    Grass,
    Dirt,
    Stone,
    Cobble,
    Ash,
}

impl TileKind {
    /// Every wall variant.
    pub const WALLS: [TileKind; 4] = [
        TileKind::EarthWall,
        TileKind::MossyWall,
        TileKind::StoneWall,
        TileKind::ObsidianWall,
    ];

    /// Every floor variant.
    pub const FLOORS: [TileKind; 5] = [
        TileKind::Grass,
        TileKind::Dirt,
        TileKind::Stone,
        TileKind::Cobble,
        TileKind::Ash,
    ];

    /// Returns true for wall variants.
    pub fn is_wall(self) -> bool {
        matches!(
            self,
            TileKind::EarthWall | TileKind::MossyWall | TileKind::StoneWall | TileKind::ObsidianWall
        )
    }

    /// Returns true for floor variants.
    pub fn is_floor(self) -> bool {
        !self.is_wall()
    }
}

/// Decoration or interactive object sitting on a floor tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Blocks movement and partially blocks vision
    Tree,
    /// Blocks movement only
    SmallTree,
    Sapling,
    Mushroom,
    Chest,
    /// Victory exit on the final depth
    Door,
    /// Leads to the next depth
    StairsDown,
}

impl FeatureKind {
    /// Returns true if entities cannot walk onto this feature.
    pub fn blocks_movement(self) -> bool {
        matches!(self, FeatureKind::Tree | FeatureKind::SmallTree)
    }

    /// Returns true if the feature is a level exit.
    pub fn is_exit(self) -> bool {
        matches!(self, FeatureKind::Door | FeatureKind::StairsDown)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub feature: Option<FeatureKind>,
}

impl Tile {
    /// Creates a featureless tile of the given kind.
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            feature: None,
        }
    }

    /// Creates the default wall tile.
    pub fn wall() -> Self {
        Self::new(TileKind::StoneWall)
    }

    /// Creates the default floor tile.
    pub fn floor() -> Self {
        Self::new(TileKind::Stone)
    }

    /// Returns true if the tile can be stepped on, ignoring entities.
    pub fn is_walkable(&self) -> bool {
        self.kind.is_floor() && !self.feature.is_some_and(FeatureKind::blocks_movement)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::wall()
    }
}

/// Fixed-size row-major grid of tiles for one depth.
///
/// # Examples
///
/// ```
/// use emberdeep::{Grid, Position, Tile};
///
/// let mut grid = Grid::new(10, 8);
/// assert!(grid.get(Position::new(3, 3)).unwrap().kind.is_wall());
/// grid.set_tile(Position::new(3, 3), Tile::floor()).unwrap();
/// assert_eq!(grid.floor_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid filled with walls.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::wall(); width as usize * height as usize],
        }
    }

    /// Checks if a position is within grid bounds.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Gets the tile at a position.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|idx| &self.tiles[idx])
    }

    /// Gets the tile at a position mutably.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos).map(move |idx| &mut self.tiles[idx])
    }

    /// Replaces the tile at a position.
    ///
    /// A wall tile never keeps a feature.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> EmberResult<()> {
        if tile.kind.is_wall() && tile.feature.is_some() {
            return Err(EmberError::InvalidState(format!(
                "feature {:?} cannot sit on wall at {:?}",
                tile.feature, pos
            )));
        }
        let slot = self.get_mut(pos).ok_or_else(|| {
            EmberError::InvalidState(format!("position {:?} is outside the grid", pos))
        })?;
        *slot = tile;
        Ok(())
    }

    /// Places a feature on a featureless floor tile.
    ///
    /// Returns false (and changes nothing) for walls, occupied tiles and
    /// out-of-bounds positions.
    pub fn place_feature(&mut self, pos: Position, feature: FeatureKind) -> bool {
        match self.get_mut(pos) {
            Some(tile) if tile.kind.is_floor() && tile.feature.is_none() => {
                tile.feature = Some(feature);
                true
            }
            _ => false,
        }
    }

    /// Removes any feature at a position.
    pub fn clear_feature(&mut self, pos: Position) {
        if let Some(tile) = self.get_mut(pos) {
            tile.feature = None;
        }
    }

    /// Iterates over every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as i32;
        (0..self.height as i32).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Iterates over positions paired with their tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.positions().zip(self.tiles.iter())
    }

    /// Returns all floor positions in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        self.iter()
            .filter(|(_, tile)| tile.kind.is_floor())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Counts floor tiles.
    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.kind.is_floor()).count()
    }

    /// Returns the positions carrying the given feature.
    pub fn feature_positions(&self, feature: FeatureKind) -> Vec<Position> {
        self.iter()
            .filter(|(_, tile)| tile.feature == Some(feature))
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// One dungeon depth: the grid plus everything placed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Depth number, starting at 1
    pub depth: u32,
    pub grid: Grid,
    /// Position of the stairs or victory door
    pub exit: Position,
    /// Either [`FeatureKind::StairsDown`] or [`FeatureKind::Door`]
    pub exit_kind: FeatureKind,
    /// Firepits and other light sources, rebuilt with each level
    pub lights: Vec<LightSource>,
}

impl Level {
    /// Returns true if this level's exit wins the game.
    pub fn is_final(&self) -> bool {
        self.exit_kind == FeatureKind::Door
    }
}
