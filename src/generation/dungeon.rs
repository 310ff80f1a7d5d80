//! # Cave Generation
//!
//! Cellular-automaton cave levels.
//!
//! Each attempt:
//! 1. Seeds random noise inside the depth's play area
//! 2. Smooths it with the birth/survival automaton
//! 3. Keeps only the largest connected region
//! 4. Paints wall and floor variants from the depth palette
//! 5. Scatters decorations and (shallow only) trees that keep the walkable
//!    area connected
//! 6. Places the single exit
//!
//! Attempts whose region is too small are discarded and regenerated.

use crate::game::{FeatureKind, Grid, Level, Position, Tile};
use crate::generation::{
    find_connected_regions, flood_fill, is_connected, largest_region, GenerationConfig, Generator,
    Palette, PassabilityGrid,
};
use crate::{EmberError, EmberResult};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Generator for one depth of the cave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaveGenerator {
    depth: u32,
}

impl CaveGenerator {
    /// Creates a generator for the given depth (1 is the first).
    ///
    /// # Examples
    ///
    /// ```
    /// use emberdeep::{utils, CaveGenerator, GenerationConfig, Generator};
    ///
    /// let config = GenerationConfig::for_testing();
    /// let mut rng = utils::create_rng(7);
    /// let level = CaveGenerator::new(1).generate(&config, &mut rng).unwrap();
    /// assert_eq!(level.depth, 1);
    /// assert!(level.grid.floor_count() >= config.min_floor_tiles);
    /// ```
    pub fn new(depth: u32) -> Self {
        Self { depth }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Exit feature for this depth.
    pub fn exit_kind(&self, config: &GenerationConfig) -> FeatureKind {
        if self.depth >= config.final_depth {
            FeatureKind::Door
        } else {
            FeatureKind::StairsDown
        }
    }

    /// Random noise inside the play area, walls everywhere else.
    fn seed_cells(&self, config: &GenerationConfig, rng: &mut StdRng) -> PassabilityGrid {
        let (min, max) = config.play_area(self.depth);
        let wall_probability = config.wall_probability(self.depth);
        let mut cells = PassabilityGrid::new(config.width, config.height);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                cells.set(Position::new(x, y), !rng.gen_bool(wall_probability));
            }
        }
        cells
    }

    /// One automaton generation. Cells outside the play area stay wall.
    fn smooth(&self, cells: &PassabilityGrid, config: &GenerationConfig) -> PassabilityGrid {
        let (min, max) = config.play_area(self.depth);
        let mut next = PassabilityGrid::new(cells.width(), cells.height());
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let pos = Position::new(x, y);
                let walls = pos
                    .adjacent_positions()
                    .into_iter()
                    .filter(|n| !cells.is_passable(*n))
                    .count() as u32;
                let is_wall = if cells.is_passable(pos) {
                    walls >= config.birth_threshold
                } else {
                    walls >= config.survival_threshold
                };
                next.set(pos, !is_wall);
            }
        }
        next
    }

    /// Runs the automaton and prunes everything but the largest region.
    fn carve(&self, config: &GenerationConfig, rng: &mut StdRng) -> Option<PassabilityGrid> {
        let mut cells = self.seed_cells(config, rng);
        for _ in 0..config.smoothing_generations {
            cells = self.smooth(&cells, config);
        }

        let regions = find_connected_regions(&cells);
        let largest = largest_region(&regions)?;
        debug!(
            "depth {}: {} regions, keeping {} of {} floor cells",
            self.depth,
            regions.len(),
            largest.len(),
            cells.count()
        );
        if largest.len() < config.min_floor_tiles.max(1) {
            return None;
        }

        Some(PassabilityGrid::from_fn(config.width, config.height, |pos| {
            largest.contains(pos)
        }))
    }

    /// Paints wall and floor variants in row-major order.
    fn paint(
        &self,
        cells: &PassabilityGrid,
        palette: &Palette,
        rng: &mut StdRng,
    ) -> EmberResult<Grid> {
        let mut grid = Grid::new(cells.width(), cells.height());
        for pos in grid.positions().collect::<Vec<_>>() {
            let kind = if cells.is_passable(pos) {
                palette.pick_floor(rng)
            } else {
                palette.pick_wall(rng)
            };
            grid.set_tile(pos, Tile::new(kind))?;
        }
        Ok(grid)
    }

    /// Scatters decorations and trees over the floor.
    fn scatter_features(
        &self,
        grid: &mut Grid,
        palette: &Palette,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> usize {
        let grows_trees = self.depth <= config.tree_max_depth;
        let mut placed = 0;
        for pos in grid.floor_positions() {
            if !rng.gen_bool(config.feature_chance) {
                continue;
            }
            if grows_trees && rng.gen_bool(config.tree_chance) {
                let tree = palette.pick_tree(rng);
                if grid.place_feature(pos, tree) {
                    if is_connected(&PassabilityGrid::walkable(grid)) {
                        placed += 1;
                    } else {
                        grid.clear_feature(pos);
                    }
                }
            } else if grid.place_feature(pos, palette.pick_decoration(rng)) {
                placed += 1;
            }
        }
        placed
    }

    /// Places the exit on a random feature-free floor tile.
    fn place_exit(&self, grid: &mut Grid, kind: FeatureKind, rng: &mut StdRng) -> Option<Position> {
        let candidates: Vec<Position> = grid
            .iter()
            .filter(|(_, tile)| tile.kind.is_floor() && tile.feature.is_none())
            .map(|(pos, _)| pos)
            .collect();
        let exit = *candidates.choose(rng)?;
        grid.place_feature(exit, kind).then_some(exit)
    }

    /// One full attempt; `None` when the cave came out too small.
    fn attempt(&self, config: &GenerationConfig, rng: &mut StdRng) -> EmberResult<Option<Level>> {
        let Some(cells) = self.carve(config, rng) else {
            return Ok(None);
        };

        let palette = Palette::for_depth(self.depth)?;
        let mut grid = self.paint(&cells, &palette, rng)?;
        let features = self.scatter_features(&mut grid, &palette, config, rng);

        let exit_kind = self.exit_kind(config);
        let Some(exit) = self.place_exit(&mut grid, exit_kind, rng) else {
            return Ok(None);
        };
        debug!(
            "depth {}: {:?} theme, {} features, {:?} at {:?}",
            self.depth, palette.theme, features, exit_kind, exit
        );

        Ok(Some(Level {
            depth: self.depth,
            grid,
            exit,
            exit_kind,
            lights: Vec::new(),
        }))
    }
}

impl Generator<Level> for CaveGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> EmberResult<Level> {
        config.validate()?;

        for attempt in 1..=config.max_generation_attempts {
            match self.attempt(config, rng)? {
                Some(level) => {
                    self.validate(&level, config)?;
                    debug!(
                        "{}: depth {} generated on attempt {} with {} floor tiles",
                        self.generator_type(),
                        self.depth,
                        attempt,
                        level.grid.floor_count()
                    );
                    return Ok(level);
                }
                None => warn!(
                    "{}: depth {} cave too small on attempt {}/{}, regenerating",
                    self.generator_type(),
                    self.depth,
                    attempt,
                    config.max_generation_attempts
                ),
            }
        }

        Err(EmberError::GenerationFailed(format!(
            "no cave with at least {} floor tiles at depth {} after {} attempts",
            config.min_floor_tiles, self.depth, config.max_generation_attempts
        )))
    }

    fn validate(&self, level: &Level, config: &GenerationConfig) -> EmberResult<()> {
        let grid = &level.grid;
        if grid.width != config.width || grid.height != config.height {
            return Err(EmberError::GenerationFailed(format!(
                "level is {}x{}, expected {}x{}",
                grid.width, grid.height, config.width, config.height
            )));
        }

        let floors = PassabilityGrid::floors(grid);
        if floors.count() == 0 {
            return Err(EmberError::GenerationFailed(
                "level has no floor tiles".to_string(),
            ));
        }
        if find_connected_regions(&floors).len() != 1 {
            return Err(EmberError::GenerationFailed(
                "floor is split into several regions".to_string(),
            ));
        }

        let walkable = PassabilityGrid::walkable(grid);
        if flood_fill(&walkable, level.exit).len() != walkable.count() {
            return Err(EmberError::GenerationFailed(
                "walkable area is not reachable from the exit".to_string(),
            ));
        }

        let exits: Vec<Position> = grid
            .iter()
            .filter(|(_, tile)| tile.feature.map_or(false, FeatureKind::is_exit))
            .map(|(pos, _)| pos)
            .collect();
        let exit_feature = grid.get(level.exit).and_then(|tile| tile.feature);
        if exits != [level.exit] || exit_feature != Some(level.exit_kind) {
            return Err(EmberError::GenerationFailed(format!(
                "expected a single {:?} at {:?}, found exits at {:?}",
                level.exit_kind, level.exit, exits
            )));
        }

        if grid
            .iter()
            .any(|(_, tile)| tile.feature.is_some() && !tile.kind.is_floor())
        {
            return Err(EmberError::GenerationFailed(
                "feature placed on a wall".to_string(),
            ));
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "CaveGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;

    fn generate(depth: u32, seed: u64) -> (Level, GenerationConfig) {
        let config = GenerationConfig::for_testing();
        let mut rng = utils::create_rng(seed);
        let level = CaveGenerator::new(depth).generate(&config, &mut rng).unwrap();
        (level, config)
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let (a, _) = generate(2, 99);
        let (b, _) = generate(2, 99);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.exit, b.exit);
    }

    #[test]
    fn test_border_is_always_wall() {
        for depth in 1..=4 {
            let (level, config) = generate(depth, 5);
            for pos in level.grid.positions() {
                let border = pos.x == 0
                    || pos.y == 0
                    || pos.x == config.width as i32 - 1
                    || pos.y == config.height as i32 - 1;
                if border {
                    assert!(level.grid.get(pos).unwrap().kind.is_wall());
                }
            }
        }
    }

    #[test]
    fn test_early_depth_stays_inside_play_area() {
        let (level, config) = generate(1, 17);
        let (min, max) = config.play_area(1);
        for pos in level.grid.floor_positions() {
            assert!(pos.x >= min.x && pos.x <= max.x);
            assert!(pos.y >= min.y && pos.y <= max.y);
        }
    }

    #[test]
    fn test_single_exit_and_kind_by_depth() {
        let (shallow, config) = generate(1, 8);
        assert_eq!(shallow.exit_kind, FeatureKind::StairsDown);
        assert!(!shallow.is_final());

        let (last, _) = generate(config.final_depth, 8);
        assert_eq!(last.exit_kind, FeatureKind::Door);
        assert!(last.is_final());
        assert!(last.grid.feature_positions(FeatureKind::StairsDown).is_empty());
        assert_eq!(last.grid.feature_positions(FeatureKind::Door), vec![last.exit]);
    }

    #[test]
    fn test_no_trees_below_tree_depth() {
        let mut config = GenerationConfig::for_testing();
        config.feature_chance = 0.5;
        config.tree_chance = 1.0;
        let mut rng = utils::create_rng(21);
        let level = CaveGenerator::new(config.tree_max_depth + 1)
            .generate(&config, &mut rng)
            .unwrap();
        assert!(level.grid.feature_positions(FeatureKind::Tree).is_empty());
        assert!(level.grid.feature_positions(FeatureKind::SmallTree).is_empty());
    }

    #[test]
    fn test_dense_trees_keep_walkable_area_connected() {
        let mut config = GenerationConfig::for_testing();
        config.feature_chance = 0.6;
        config.tree_chance = 1.0;
        let mut rng = utils::create_rng(4);
        let level = CaveGenerator::new(1).generate(&config, &mut rng).unwrap();

        let trees = level.grid.feature_positions(FeatureKind::Tree).len()
            + level.grid.feature_positions(FeatureKind::SmallTree).len();
        assert!(trees > 0);
        assert!(is_connected(&PassabilityGrid::walkable(&level.grid)));
    }

    #[test]
    fn test_impossible_floor_budget_fails() {
        let mut config = GenerationConfig::for_testing();
        config.min_floor_tiles = (config.width * config.height) as usize;
        config.max_generation_attempts = 2;
        let mut rng = utils::create_rng(1);
        let result = CaveGenerator::new(3).generate(&config, &mut rng);
        assert!(matches!(result, Err(EmberError::GenerationFailed(_))));
    }

    #[test]
    fn test_validation_catches_second_exit() {
        let (mut level, config) = generate(1, 30);
        let generator = CaveGenerator::new(1);
        assert!(generator.validate(&level, &config).is_ok());

        let spare = level
            .grid
            .iter()
            .find(|(_, tile)| tile.kind.is_floor() && tile.feature.is_none())
            .map(|(pos, _)| pos)
            .unwrap();
        assert!(level.grid.place_feature(spare, FeatureKind::StairsDown));
        assert!(generator.validate(&level, &config).is_err());
    }

    #[test]
    fn test_generator_type() {
        assert_eq!(CaveGenerator::new(1).generator_type(), "CaveGenerator");
    }
}
