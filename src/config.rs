//! # Game Configuration
//!
//! Compile-time defaults plus the serde-backed [`GameConfig`] that bundles the
//! tunables of every subsystem. A config can be loaded from a JSON file; any
//! field left out falls back to its default.

use crate::game::CombatConfig;
use crate::generation::{GenerationConfig, PopulationConfig};
use crate::visibility::VisibilityConfig;
use crate::{EmberError, EmberResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default grid width in tiles
pub const DEFAULT_GRID_WIDTH: u32 = 80;

/// Default grid height in tiles
pub const DEFAULT_GRID_HEIGHT: u32 = 50;

/// Smallest grid edge the generator accepts
pub const MIN_GRID_EDGE: u32 = 8;

/// Default player starting health
pub const DEFAULT_PLAYER_HEALTH: u32 = 100;

/// Default interval between periodic ticks
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 400;

/// Default number of depths; the last one holds the victory door
pub const DEFAULT_FINAL_DEPTH: u32 = 5;

/// Top-level configuration for a [`crate::GameSession`].
///
/// # Examples
///
/// ```
/// use emberdeep::GameConfig;
///
/// let config = GameConfig::with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the session random number generator
    pub seed: u64,
    /// Level generator parameters
    pub generation: GenerationConfig,
    /// Monster, NPC and light placement parameters
    pub population: PopulationConfig,
    /// Field of view and lighting parameters
    pub visibility: VisibilityConfig,
    /// Combat and monster AI parameters
    pub combat: CombatConfig,
    /// Interval of the periodic monster/light tick in milliseconds
    pub tick_interval_ms: u64,
}

impl GameConfig {
    /// Creates the default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Creates a small, quiet configuration used by tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            generation: GenerationConfig::for_testing(),
            population: PopulationConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> EmberResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> EmberResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> EmberResult<String> {
        serde_json::to_string_pretty(self).map_err(EmberError::from)
    }

    /// Rejects configurations the core cannot run with.
    pub fn validate(&self) -> EmberResult<()> {
        self.generation.validate()?;
        self.population.validate()?;
        self.visibility.validate()?;
        self.combat.validate()?;
        if self.tick_interval_ms == 0 {
            return Err(EmberError::Config(
                "tick interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            generation: GenerationConfig::default(),
            population: PopulationConfig::default(),
            visibility: VisibilityConfig::default(),
            combat: CombatConfig::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Checks that a probability-like value lies in `[0, 1]`.
pub(crate) fn check_unit_interval(name: &str, value: f64) -> EmberResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EmberError::Config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
