//! # Visibility Module
//!
//! Field of view and lighting.
//!
//! The player's shadowcast footprint and every light source's footprint are
//! merged into a [`VisibilityMap`] with two layers:
//! - `visible`: this tick's illumination, rebuilt from scratch every refresh
//! - `explored`: dimmed memory of everything seen on the current depth,
//!   only ever raised until the next depth transition clears it

pub mod lighting;
pub mod shadowcast;

pub use lighting::*;
pub use shadowcast::*;

use crate::config::check_unit_interval;
use crate::game::{FeatureKind, Grid, Position, Tile};
use crate::{EmberError, EmberResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field of view and lighting tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Player sight radius in tiles
    pub sight_radius: i32,
    /// Exponent of the `1 - d^n` distance falloff
    pub falloff_exponent: f64,
    /// Ceiling of remembered (explored) brightness
    pub remembered_level: f32,
    /// Radius of firepit lights
    pub light_radius: i32,
    /// Base intensity of firepit lights
    pub light_intensity: f32,
    /// Relative flicker applied to lights every tick
    pub flicker: f32,
    /// How much light passes through a tree
    pub tree_transparency: f32,
}

impl VisibilityConfig {
    /// Rejects radii and factors the engine cannot use.
    pub fn validate(&self) -> EmberResult<()> {
        if self.sight_radius <= 0 || self.light_radius <= 0 {
            return Err(EmberError::Config(format!(
                "sight and light radius must be positive (got {} and {})",
                self.sight_radius, self.light_radius
            )));
        }
        if self.falloff_exponent <= 0.0 {
            return Err(EmberError::Config(
                "falloff exponent must be positive".to_string(),
            ));
        }
        check_unit_interval("remembered_level", f64::from(self.remembered_level))?;
        check_unit_interval("light_intensity", f64::from(self.light_intensity))?;
        check_unit_interval("flicker", f64::from(self.flicker))?;
        check_unit_interval("tree_transparency", f64::from(self.tree_transparency))?;
        Ok(())
    }

    /// Maps a tile to its transparency: walls block, trees dim, the rest is open.
    pub fn tile_transparency(&self, tile: &Tile) -> f32 {
        if tile.kind.is_wall() {
            0.0
        } else if tile.feature == Some(FeatureKind::Tree) {
            self.tree_transparency
        } else {
            1.0
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            sight_radius: 10,
            falloff_exponent: 3.0,
            remembered_level: 0.35,
            light_radius: 6,
            light_intensity: 0.9,
            flicker: 0.15,
            tree_transparency: 0.3,
        }
    }
}

/// Brightness left after distance falloff: `1 - (distance / radius)^exponent`.
///
/// Stays bright near the source and drops sharply toward the edge.
pub fn falloff(distance: f64, radius: i32, exponent: f64) -> f32 {
    if radius <= 0 {
        return 0.0;
    }
    let d = (distance / f64::from(radius)).clamp(0.0, 1.0);
    (1.0 - d.powf(exponent)) as f32
}

/// Per-tile illumination for the current depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilityMap {
    visible: HashMap<Position, f32>,
    explored: HashMap<Position, f32>,
}

impl VisibilityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// This tick's illumination of a tile, if lit.
    pub fn visible(&self, pos: Position) -> Option<f32> {
        self.visible.get(&pos).copied()
    }

    /// Remembered brightness of a tile, if explored.
    pub fn explored(&self, pos: Position) -> Option<f32> {
        self.explored.get(&pos).copied()
    }

    /// Every currently lit tile.
    pub fn visible_tiles(&self) -> &HashMap<Position, f32> {
        &self.visible
    }

    /// Every explored tile.
    pub fn explored_tiles(&self) -> &HashMap<Position, f32> {
        &self.explored
    }

    /// Forgets everything; used on depth transition.
    pub fn reset(&mut self) {
        self.visible.clear();
        self.explored.clear();
    }

    /// Raises a tile's illumination (maximum merge) and its memory.
    fn illuminate(&mut self, pos: Position, value: f32, remembered_level: f32) {
        if value <= 0.0 {
            return;
        }
        let value = value.min(1.0);
        let visible = self.visible.entry(pos).or_insert(0.0);
        *visible = visible.max(value);
        let explored = self.explored.entry(pos).or_insert(0.0);
        *explored = explored.max(value.min(remembered_level));
    }

    /// Rebuilds `visible` from the viewer and every light, raising `explored`.
    ///
    /// Lights only brighten tiles the player has explored or can reach this
    /// refresh; they never reveal unknown parts of the cave.
    pub fn refresh(
        &mut self,
        grid: &Grid,
        viewer: Position,
        lights: &[LightSource],
        config: &VisibilityConfig,
    ) -> EmberResult<()> {
        self.visible.clear();

        let transparency = |tile: &Tile| config.tile_transparency(tile);
        let sight = compute_visibility(grid, viewer, config.sight_radius, transparency)?;
        for (pos, transmittance) in sight {
            let distance = viewer.euclidean_distance(pos);
            let value =
                transmittance * falloff(distance, config.sight_radius, config.falloff_exponent);
            self.illuminate(pos, value, config.remembered_level);
        }

        for light in lights {
            let footprint = compute_visibility(grid, light.position, light.radius, transparency)?;
            for (pos, transmittance) in footprint {
                if !self.explored.contains_key(&pos) {
                    continue;
                }
                let distance = light.position.euclidean_distance(pos);
                let value = transmittance
                    * falloff(distance, light.radius, config.falloff_exponent)
                    * light.current_intensity;
                self.illuminate(pos, value, config.remembered_level);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TileKind;

    fn corridor_world() -> Grid {
        // Two rooms joined by a wall with no opening:
        // x 1..=9 is the left room, x 11..=19 the right room
        let mut grid = Grid::new(21, 9);
        for pos in grid.positions().collect::<Vec<_>>() {
            if pos.x > 0 && pos.y > 0 && pos.x < 20 && pos.y < 8 && pos.x != 10 {
                grid.set_tile(pos, Tile::new(TileKind::Dirt)).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_falloff_shape() {
        assert_eq!(falloff(0.0, 10, 3.0), 1.0);
        assert_eq!(falloff(10.0, 10, 3.0), 0.0);
        assert_eq!(falloff(20.0, 10, 3.0), 0.0);
        let mid = falloff(5.0, 10, 3.0);
        assert!((mid - 0.875).abs() < 1e-6);
        assert!(falloff(2.0, 10, 3.0) > falloff(8.0, 10, 3.0));
    }

    #[test]
    fn test_player_refresh_fills_both_layers() {
        let grid = corridor_world();
        let config = VisibilityConfig::default();
        let mut map = VisibilityMap::new();
        let viewer = Position::new(5, 4);
        map.refresh(&grid, viewer, &[], &config).unwrap();

        assert_eq!(map.visible(viewer), Some(1.0));
        assert_eq!(map.explored(viewer), Some(config.remembered_level));
        for (pos, value) in map.visible_tiles() {
            let remembered = map.explored(*pos).unwrap();
            assert!(remembered <= *value);
        }
        // The dividing wall hides the right room
        assert!(map.visible(Position::new(12, 4)).is_none());
    }

    #[test]
    fn test_explored_survives_moving_away() {
        let grid = corridor_world();
        let config = VisibilityConfig::default();
        let mut map = VisibilityMap::new();
        map.refresh(&grid, Position::new(2, 4), &[], &config).unwrap();
        let before = map.explored_tiles().clone();

        map.refresh(&grid, Position::new(9, 4), &[], &config).unwrap();
        for (pos, value) in before {
            assert!(map.explored(pos).unwrap() >= value);
        }
    }

    #[test]
    fn test_lights_do_not_reveal_unknown_areas() {
        let grid = corridor_world();
        let config = VisibilityConfig::default();
        let mut map = VisibilityMap::new();
        let torch = LightSource::new(Position::new(15, 4), 1.0, 6);

        map.refresh(&grid, Position::new(3, 4), &[torch], &config).unwrap();
        assert!(map.visible(Position::new(15, 4)).is_none());
        assert!(map.explored(Position::new(15, 4)).is_none());
    }

    #[test]
    fn test_lights_merge_by_maximum() {
        let grid = corridor_world();
        let config = VisibilityConfig::default();
        let viewer = Position::new(5, 4);

        let mut alone = VisibilityMap::new();
        alone.refresh(&grid, viewer, &[], &config).unwrap();

        let torch = LightSource::new(Position::new(8, 4), 1.0, 6);
        let mut lit = VisibilityMap::new();
        lit.refresh(&grid, viewer, &[torch], &config).unwrap();

        let far = Position::new(9, 4);
        let player_only = alone.visible(far).unwrap();
        let with_torch = lit.visible(far).unwrap();
        assert!(with_torch >= player_only);
        assert!(with_torch <= 1.0);
        // The torch's own tile is at full strength, never a sum above 1
        assert_eq!(lit.visible(Position::new(8, 4)), Some(1.0));
    }

    #[test]
    fn test_lights_brighten_remembered_tiles() {
        let grid = corridor_world();
        let config = VisibilityConfig::default();
        let mut map = VisibilityMap::new();
        map.refresh(&grid, Position::new(2, 4), &[], &config).unwrap();

        // Viewer walks into a spot where (2, 4) is far out of sight
        let torch = LightSource::new(Position::new(2, 5), 1.0, 4);
        let mut narrow = config.clone();
        narrow.sight_radius = 2;
        map.refresh(&grid, Position::new(9, 4), &[torch], &narrow).unwrap();
        assert!(map.visible(Position::new(2, 4)).unwrap() > 0.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let grid = corridor_world();
        let mut map = VisibilityMap::new();
        map.refresh(&grid, Position::new(2, 4), &[], &VisibilityConfig::default()).unwrap();
        map.reset();
        assert!(map.visible_tiles().is_empty());
        assert!(map.explored_tiles().is_empty());
    }

    #[test]
    fn test_tree_transparency_mapping() {
        let config = VisibilityConfig::default();
        let mut tile = Tile::new(TileKind::Grass);
        assert_eq!(config.tile_transparency(&tile), 1.0);
        tile.feature = Some(FeatureKind::Tree);
        assert_eq!(config.tile_transparency(&tile), 0.3);
        tile.feature = Some(FeatureKind::SmallTree);
        assert_eq!(config.tile_transparency(&tile), 1.0);
        assert_eq!(config.tile_transparency(&Tile::wall()), 0.0);
    }
}
