//! # Depth Palettes
//!
//! Weighted tile and decoration pools per depth band. Purely cosmetic: the
//! palette never changes which cells are walls.

use crate::game::{FeatureKind, TileKind};
use crate::{EmberError, EmberResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Visual band a depth belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthTheme {
    /// Grassy, earthy caves near the surface
    Shallow,
    /// Dirt and worked stone
    Middle,
    /// Ash and obsidian
    Deep,
}

impl DepthTheme {
    pub fn for_depth(depth: u32) -> Self {
        match depth {
            0..=2 => DepthTheme::Shallow,
            3..=4 => DepthTheme::Middle,
            _ => DepthTheme::Deep,
        }
    }
}

const SHALLOW_WALLS: &[(TileKind, u32)] = &[(TileKind::EarthWall, 6), (TileKind::MossyWall, 4)];
const SHALLOW_FLOORS: &[(TileKind, u32)] = &[(TileKind::Grass, 5), (TileKind::Dirt, 4)];
const SHALLOW_DECORATIONS: &[(FeatureKind, u32)] = &[
    (FeatureKind::Sapling, 6),
    (FeatureKind::Mushroom, 2),
    (FeatureKind::Chest, 1),
];

const MIDDLE_WALLS: &[(TileKind, u32)] = &[
    (TileKind::EarthWall, 2),
    (TileKind::StoneWall, 6),
    (TileKind::MossyWall, 2),
];
const MIDDLE_FLOORS: &[(TileKind, u32)] = &[
    (TileKind::Dirt, 3),
    (TileKind::Stone, 5),
    (TileKind::Cobble, 3),
];
const MIDDLE_DECORATIONS: &[(FeatureKind, u32)] = &[
    (FeatureKind::Sapling, 1),
    (FeatureKind::Mushroom, 4),
    (FeatureKind::Chest, 2),
];

const DEEP_WALLS: &[(TileKind, u32)] = &[(TileKind::StoneWall, 4), (TileKind::ObsidianWall, 6)];
const DEEP_FLOORS: &[(TileKind, u32)] = &[
    (TileKind::Stone, 4),
    (TileKind::Ash, 5),
    (TileKind::Cobble, 1),
];
const DEEP_DECORATIONS: &[(FeatureKind, u32)] =
    &[(FeatureKind::Mushroom, 3), (FeatureKind::Chest, 3)];

/// One weighted pool of choices.
#[derive(Debug, Clone)]
struct Pool<T> {
    items: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> Pool<T> {
    fn new(entries: &[(T, u32)]) -> EmberResult<Self> {
        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight))
            .map_err(|e| EmberError::GenerationFailed(format!("bad palette weights: {}", e)))?;
        Ok(Self {
            items: entries.iter().map(|(item, _)| *item).collect(),
            index,
        })
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)]
    }
}

/// Weighted wall, floor and decoration pools for one depth.
#[derive(Debug, Clone)]
pub struct Palette {
    pub theme: DepthTheme,
    walls: Pool<TileKind>,
    floors: Pool<TileKind>,
    decorations: Pool<FeatureKind>,
}

impl Palette {
    /// Builds the palette for a depth.
    pub fn for_depth(depth: u32) -> EmberResult<Self> {
        let theme = DepthTheme::for_depth(depth);
        let (walls, floors, decorations) = match theme {
            DepthTheme::Shallow => (SHALLOW_WALLS, SHALLOW_FLOORS, SHALLOW_DECORATIONS),
            DepthTheme::Middle => (MIDDLE_WALLS, MIDDLE_FLOORS, MIDDLE_DECORATIONS),
            DepthTheme::Deep => (DEEP_WALLS, DEEP_FLOORS, DEEP_DECORATIONS),
        };

        Ok(Self {
            theme,
            walls: Pool::new(walls)?,
            floors: Pool::new(floors)?,
            decorations: Pool::new(decorations)?,
        })
    }

    pub fn pick_wall<R: Rng + ?Sized>(&self, rng: &mut R) -> TileKind {
        self.walls.pick(rng)
    }

    pub fn pick_floor<R: Rng + ?Sized>(&self, rng: &mut R) -> TileKind {
        self.floors.pick(rng)
    }

    /// A passable decoration.
    pub fn pick_decoration<R: Rng + ?Sized>(&self, rng: &mut R) -> FeatureKind {
        self.decorations.pick(rng)
    }

    /// A movement-blocking tree.
    pub fn pick_tree<R: Rng + ?Sized>(&self, rng: &mut R) -> FeatureKind {
        if rng.gen_bool(0.5) {
            FeatureKind::Tree
        } else {
            FeatureKind::SmallTree
        }
    }
}
