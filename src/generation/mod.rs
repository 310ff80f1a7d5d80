//! # Generation Module
//!
//! Procedural content for every depth of the cave.
//!
//! Levels are grown with a cellular automaton, pruned to their largest
//! connected region, dressed with a depth-themed palette and then populated
//! with the player spawn, monsters, NPCs and light sources.

pub mod dungeon;
pub mod encounters;
pub mod palette;
pub mod regions;

pub use dungeon::*;
pub use encounters::*;
pub use palette::*;
pub use regions::*;

use crate::config::{
    check_unit_interval, DEFAULT_FINAL_DEPTH, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH,
    MIN_GRID_EDGE,
};
use crate::game::Position;
use crate::{EmberError, EmberResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration for level generation.
///
/// Controls the automaton, the early-depth play area, feature density and
/// the retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// Wall probability of the initial noise at depth 0
    pub base_wall_probability: f64,
    /// Extra wall probability added per depth
    pub wall_probability_per_depth: f64,
    /// Upper bound for the wall probability
    pub max_wall_probability: f64,
    /// Number of smoothing passes
    pub smoothing_generations: u32,
    /// A floor cell with at least this many wall neighbours becomes wall
    pub birth_threshold: u32,
    /// A wall cell with at least this many wall neighbours stays wall
    pub survival_threshold: u32,
    /// First depth that uses the whole grid
    pub full_area_depth: u32,
    /// Fraction of each dimension used at depth 1
    pub early_area_fraction: f64,
    /// Fraction added per depth until the full area is reached
    pub early_area_growth: f64,
    /// Chance of a feature on each floor tile
    pub feature_chance: f64,
    /// Chance that a feature is a blocking tree
    pub tree_chance: f64,
    /// Deepest depth where trees grow
    pub tree_max_depth: u32,
    /// Depth that holds the victory door
    pub final_depth: u32,
    /// Smallest accepted region; anything smaller is regenerated
    pub min_floor_tiles: usize,
    /// Regeneration budget per level
    pub max_generation_attempts: u32,
}

impl GenerationConfig {
    /// Creates the default generation configuration for a grid size.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberdeep::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(80, 50);
    /// assert!(config.validate().is_ok());
    /// assert!((config.wall_probability(1) - 0.46).abs() < 1e-9);
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            base_wall_probability: 0.45,
            wall_probability_per_depth: 0.01,
            max_wall_probability: 0.6,
            smoothing_generations: 4,
            birth_threshold: 5,
            survival_threshold: 4,
            full_area_depth: 3,
            early_area_fraction: 0.6,
            early_area_growth: 0.15,
            feature_chance: 0.05,
            tree_chance: 0.2,
            tree_max_depth: 2,
            final_depth: DEFAULT_FINAL_DEPTH,
            min_floor_tiles: 20,
            max_generation_attempts: 8,
        }
    }

    /// Creates a configuration for testing with smaller levels.
    pub fn for_testing() -> Self {
        Self::new(40, 30)
    }

    /// Wall probability of the initial noise at a depth.
    pub fn wall_probability(&self, depth: u32) -> f64 {
        let probability =
            self.base_wall_probability + self.wall_probability_per_depth * f64::from(depth);
        probability.min(self.max_wall_probability).clamp(0.0, 1.0)
    }

    /// Inclusive corners of the area the automaton may carve at a depth.
    ///
    /// The outer border is never part of it. Early depths use a centered
    /// sub-rectangle that grows with depth.
    pub fn play_area(&self, depth: u32) -> (Position, Position) {
        let full_min = Position::new(1, 1);
        let full_max = Position::new(self.width as i32 - 2, self.height as i32 - 2);
        if depth >= self.full_area_depth {
            return (full_min, full_max);
        }

        let steps = f64::from(depth.saturating_sub(1));
        let fraction = (self.early_area_fraction + self.early_area_growth * steps).min(1.0);
        let span = |edge: u32| -> i32 {
            let inner = edge as i32 - 2;
            ((f64::from(edge) * fraction).round() as i32).clamp(3.min(inner), inner)
        };
        let (w, h) = (span(self.width), span(self.height));
        let left = ((self.width as i32 - w) / 2).max(1);
        let top = ((self.height as i32 - h) / 2).max(1);
        let min = Position::new(left, top);
        let max = Position::new(
            (left + w - 1).min(full_max.x),
            (top + h - 1).min(full_max.y),
        );
        (min, max)
    }

    /// Rejects settings the generator cannot honour.
    pub fn validate(&self) -> EmberResult<()> {
        if self.width < MIN_GRID_EDGE || self.height < MIN_GRID_EDGE {
            return Err(EmberError::Config(format!(
                "grid must be at least {}x{}, got {}x{}",
                MIN_GRID_EDGE, MIN_GRID_EDGE, self.width, self.height
            )));
        }
        check_unit_interval("base_wall_probability", self.base_wall_probability)?;
        check_unit_interval("wall_probability_per_depth", self.wall_probability_per_depth)?;
        check_unit_interval("max_wall_probability", self.max_wall_probability)?;
        check_unit_interval("feature_chance", self.feature_chance)?;
        check_unit_interval("tree_chance", self.tree_chance)?;
        if self.early_area_fraction <= 0.0 || self.early_area_fraction > 1.0 {
            return Err(EmberError::Config(format!(
                "early_area_fraction must be within (0, 1], got {}",
                self.early_area_fraction
            )));
        }
        if self.early_area_growth < 0.0 {
            return Err(EmberError::Config(
                "early_area_growth cannot be negative".to_string(),
            ));
        }
        if self.birth_threshold > 8 || self.survival_threshold > 8 {
            return Err(EmberError::Config(
                "automaton thresholds cannot exceed 8 neighbours".to_string(),
            ));
        }
        if self.final_depth == 0 {
            return Err(EmberError::Config("final depth must be at least 1".to_string()));
        }
        if self.max_generation_attempts == 0 {
            return Err(EmberError::Config(
                "at least one generation attempt is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT)
    }
}

/// Trait for procedural generators.
///
/// Generators draw every random decision from the injected RNG so that a
/// seed reproduces their output exactly.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> EmberResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> EmberResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(80, 50);
        assert_eq!(config.width, 80);
        assert_eq!(config.height, 50);
        assert_eq!(config.smoothing_generations, 4);
        assert!(config.validate().is_ok());
        assert!(GenerationConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_wall_probability_grows_and_caps() {
        let config = GenerationConfig::default();
        assert!((config.wall_probability(1) - 0.46).abs() < 1e-9);
        assert!(config.wall_probability(5) > config.wall_probability(1));
        assert!((config.wall_probability(100) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_play_area_grows_with_depth() {
        let config = GenerationConfig::new(80, 50);
        let (min1, max1) = config.play_area(1);
        let (min2, max2) = config.play_area(2);
        let (min3, max3) = config.play_area(3);

        assert_eq!(max1.x - min1.x + 1, 48);
        assert_eq!(max1.y - min1.y + 1, 30);
        assert!(max2.x - min2.x > max1.x - min1.x);
        assert_eq!((min3, max3), (Position::new(1, 1), Position::new(78, 48)));
    }

    #[test]
    fn test_play_area_never_touches_border() {
        let mut config = GenerationConfig::new(8, 8);
        config.early_area_fraction = 1.0;
        for depth in 0..5 {
            let (min, max) = config.play_area(depth);
            assert!(min.x >= 1 && min.y >= 1);
            assert!(max.x <= 6 && max.y <= 6);
            assert!(min.x <= max.x && min.y <= max.y);
        }
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let mut config = GenerationConfig::default();
        config.width = 4;
        assert!(matches!(config.validate(), Err(EmberError::Config(_))));

        let mut config = GenerationConfig::default();
        config.feature_chance = 1.5;
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::default();
        config.final_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utils_rng_is_reproducible() {
        let mut a = utils::create_rng(12345);
        let mut b = utils::create_rng(12345);
        let left: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let right: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(left, right);
    }
}
