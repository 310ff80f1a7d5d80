//! # Encounter Placement
//!
//! Populates a freshly generated level: player spawn, monsters drawn from
//! depth-themed pools, decorative NPCs and firepit lights.

use crate::config::check_unit_interval;
use crate::game::{
    new_entity_id, EntityManager, Level, Monster, MonsterKind, Npc, NpcKind, Position,
};
use crate::generation::{flood_fill, DepthTheme, PassabilityGrid};
use crate::visibility::{LightSource, VisibilityConfig};
use crate::{EmberError, EmberResult};
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Monster, NPC and light placement tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Monsters on every depth
    pub base_monsters: u32,
    /// Additional monsters per depth
    pub monsters_per_depth: u32,
    /// Monsters never exceed this fraction of the floor tiles
    pub max_monster_fraction: f64,
    /// Upper bound of NPCs on shallow depths
    pub max_npcs: u32,
    /// Deepest depth that can hold more than one NPC
    pub npc_max_depth: u32,
    /// Monsters spawn further than this Manhattan distance from the player when possible
    pub spawn_clearance: u32,
    /// Extra firepits per depth, besides the one by the exit
    pub firepits_per_depth: u32,
    /// Upper bound of extra firepits
    pub max_firepits: u32,
}

impl PopulationConfig {
    /// Creates a quieter configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            base_monsters: 1,
            monsters_per_depth: 1,
            max_npcs: 1,
            max_firepits: 1,
            ..Self::default()
        }
    }

    /// Number of monsters for a depth with `floor_tiles` floor cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberdeep::PopulationConfig;
    ///
    /// let config = PopulationConfig::default();
    /// assert_eq!(config.monster_count(1, 1000), 4);
    /// // Capped at 10% of the floor
    /// assert_eq!(config.monster_count(5, 50), 5);
    /// ```
    pub fn monster_count(&self, depth: u32, floor_tiles: usize) -> usize {
        let wanted = self.base_monsters as usize + (self.monsters_per_depth * depth) as usize;
        let cap = (floor_tiles as f64 * self.max_monster_fraction).floor() as usize;
        wanted.min(cap)
    }

    /// Rejects unusable population settings.
    pub fn validate(&self) -> EmberResult<()> {
        check_unit_interval("max_monster_fraction", self.max_monster_fraction)?;
        if self.max_npcs > 16 {
            return Err(EmberError::Config(format!(
                "at most 16 NPCs per depth, got {}",
                self.max_npcs
            )));
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_monsters: 2,
            monsters_per_depth: 2,
            max_monster_fraction: 0.1,
            max_npcs: 2,
            npc_max_depth: 3,
            spawn_clearance: 4,
            firepits_per_depth: 1,
            max_firepits: 4,
        }
    }
}

const SHALLOW_MONSTERS: &[(MonsterKind, u32)] = &[
    (MonsterKind::Rat, 5),
    (MonsterKind::Bat, 4),
    (MonsterKind::Slime, 3),
    (MonsterKind::Goblin, 2),
];
const MIDDLE_MONSTERS: &[(MonsterKind, u32)] = &[
    (MonsterKind::Bat, 1),
    (MonsterKind::Slime, 2),
    (MonsterKind::Goblin, 4),
    (MonsterKind::Skeleton, 4),
    (MonsterKind::Orc, 2),
];
const DEEP_MONSTERS: &[(MonsterKind, u32)] = &[
    (MonsterKind::Skeleton, 2),
    (MonsterKind::Orc, 4),
    (MonsterKind::Wraith, 3),
    (MonsterKind::Demon, 2),
];

const NPC_KINDS: [NpcKind; 4] = [
    NpcKind::Wanderer,
    NpcKind::Herbalist,
    NpcKind::Hermit,
    NpcKind::Ghost,
];

/// Monster kinds and weights that may appear at a depth.
pub fn monster_pool(depth: u32) -> &'static [(MonsterKind, u32)] {
    match DepthTheme::for_depth(depth) {
        DepthTheme::Shallow => SHALLOW_MONSTERS,
        DepthTheme::Middle => MIDDLE_MONSTERS,
        DepthTheme::Deep => DEEP_MONSTERS,
    }
}

/// Walkable, featureless tiles in row-major order.
fn open_tiles(level: &Level) -> Vec<Position> {
    level
        .grid
        .iter()
        .filter(|(_, tile)| tile.is_walkable() && tile.feature.is_none())
        .map(|(pos, _)| pos)
        .collect()
}

/// Places the player, monsters, NPCs and lights on a level.
///
/// Any previous NPCs and monsters are dropped. The player keeps its id and
/// health and is moved to the returned spawn tile.
pub fn populate_level<R: Rng + ?Sized>(
    level: &mut Level,
    entities: &mut EntityManager,
    population: &PopulationConfig,
    visibility: &VisibilityConfig,
    rng: &mut R,
) -> EmberResult<Position> {
    entities.clear_level_entities();

    let mut open = open_tiles(level);
    if open.is_empty() {
        return Err(EmberError::InvalidState(format!(
            "depth {} has no open tile for the player",
            level.depth
        )));
    }
    open.shuffle(rng);
    let spawn = open[0];
    entities.place_player(spawn);

    // Far tiles first so monsters keep their distance when the cave allows it
    let (mut candidates, near): (Vec<Position>, Vec<Position>) = open[1..]
        .iter()
        .partition(|pos| pos.manhattan_distance(spawn) > population.spawn_clearance);
    candidates.extend(near);
    let mut candidates = candidates.into_iter();

    let wanted = population.monster_count(level.depth, level.grid.floor_count());
    let pool = monster_pool(level.depth);
    let weights = WeightedIndex::new(pool.iter().map(|(_, weight)| *weight))
        .map_err(|e| EmberError::GenerationFailed(format!("bad monster weights: {}", e)))?;
    let mut monsters = 0;
    while monsters < wanted {
        let Some(pos) = candidates.next() else { break };
        let kind = pool[weights.sample(rng)].0;
        if entities.add_monster(Monster::new(new_entity_id(rng), kind, pos)) {
            monsters += 1;
        }
    }

    let npc_cap = if level.depth <= population.npc_max_depth {
        population.max_npcs
    } else {
        population.max_npcs.min(1)
    };
    let wanted_npcs = rng.gen_range(0..=npc_cap);
    let mut npcs = 0;
    let mut npc_tiles = HashSet::new();
    while npcs < wanted_npcs {
        let Some(pos) = candidates.next() else { break };
        if entities.is_occupied(pos) || !stays_connected(level, &npc_tiles, pos, spawn) {
            continue;
        }
        let kind = NPC_KINDS[rng.gen_range(0..NPC_KINDS.len())];
        if entities.add_npc(Npc::new(new_entity_id(rng), kind, pos)) {
            npc_tiles.insert(pos);
            npcs += 1;
        }
    }

    level.lights = place_lights(level, population, visibility, rng);

    debug!(
        "depth {} populated: spawn {:?}, {} monsters, {} NPCs, {} lights",
        level.depth,
        spawn,
        monsters,
        npcs,
        level.lights.len()
    );
    Ok(spawn)
}

/// True if an NPC standing at `candidate` (next to those at `npc_tiles`)
/// still leaves every walkable tile, the exit included, reachable from `spawn`.
///
/// NPCs never move, so one on a chokepoint would wall off the exit for good.
fn stays_connected(
    level: &Level,
    npc_tiles: &HashSet<Position>,
    candidate: Position,
    spawn: Position,
) -> bool {
    let grid = &level.grid;
    let walkable = PassabilityGrid::from_fn(grid.width, grid.height, |pos| {
        pos != candidate
            && !npc_tiles.contains(&pos)
            && grid.get(pos).map_or(false, |tile| tile.is_walkable())
    });
    let reached = flood_fill(&walkable, spawn);
    reached.contains(&level.exit) && reached.len() == walkable.count()
}

/// One firepit beside the exit plus extra firepits scaled by depth.
fn place_lights<R: Rng + ?Sized>(
    level: &Level,
    population: &PopulationConfig,
    visibility: &VisibilityConfig,
    rng: &mut R,
) -> Vec<LightSource> {
    let light = |position| {
        LightSource::new(position, visibility.light_intensity, visibility.light_radius)
    };

    let beside_exit: Vec<Position> = level
        .exit
        .adjacent_positions()
        .into_iter()
        .filter(|pos| level.grid.get(*pos).map_or(false, |tile| tile.kind.is_floor()))
        .collect();
    let anchor = beside_exit.choose(rng).copied().unwrap_or(level.exit);
    let mut lights = vec![light(anchor)];

    let extra = (population.firepits_per_depth * level.depth).min(population.max_firepits) as usize;
    let floors: Vec<Position> = level
        .grid
        .floor_positions()
        .into_iter()
        .filter(|pos| *pos != anchor)
        .collect();
    lights.extend(floors.choose_multiple(rng, extra).map(|pos| light(*pos)));
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DamageRange, Entity, FeatureKind, Player, Tile};
    use crate::generation::{utils, CaveGenerator, GenerationConfig, Generator};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn player() -> EntityManager {
        let damage = DamageRange::new(4, 9);
        EntityManager::new(Player::new(Uuid::from_u128(1), Position::origin(), 100, damage))
    }

    fn generated(depth: u32, seed: u64) -> Level {
        let mut rng = utils::create_rng(seed);
        CaveGenerator::new(depth)
            .generate(&GenerationConfig::default(), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_monster_count_formula() {
        let config = PopulationConfig::default();
        assert_eq!(config.monster_count(1, 10_000), 4);
        assert_eq!(config.monster_count(3, 10_000), 8);
        assert_eq!(config.monster_count(3, 40), 4);
        assert_eq!(config.monster_count(1, 5), 0);
    }

    #[test]
    fn test_population_has_no_overlap() {
        let mut level = generated(3, 77);
        let mut entities = player();
        let mut rng = utils::create_rng(78);
        let spawn = populate_level(
            &mut level,
            &mut entities,
            &PopulationConfig::default(),
            &VisibilityConfig::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(entities.player().position, spawn);
        let mut taken = HashSet::new();
        taken.insert(spawn);
        for monster in entities.monsters() {
            assert!(taken.insert(monster.position()), "{:?}", monster.position());
            assert!(level.grid.get(monster.position).unwrap().is_walkable());
        }
        for npc in entities.npcs() {
            assert!(taken.insert(npc.position()));
        }
        assert_eq!(
            entities.monsters().len(),
            PopulationConfig::default().monster_count(3, level.grid.floor_count())
        );
    }

    #[test]
    fn test_spawn_avoids_features() {
        for seed in 0..5 {
            let mut level = generated(1, seed);
            let mut entities = player();
            let mut rng = utils::create_rng(seed + 100);
            let spawn = populate_level(
                &mut level,
                &mut entities,
                &PopulationConfig::default(),
                &VisibilityConfig::default(),
                &mut rng,
            )
            .unwrap();
            let tile = level.grid.get(spawn).unwrap();
            assert!(tile.kind.is_floor());
            assert_eq!(tile.feature, None);
            assert_ne!(spawn, level.exit);
        }
    }

    #[test]
    fn test_lights_include_one_beside_exit() {
        let mut level = generated(2, 9);
        let mut entities = player();
        let mut rng = utils::create_rng(10);
        populate_level(
            &mut level,
            &mut entities,
            &PopulationConfig::default(),
            &VisibilityConfig::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(level.lights.len(), 3);
        assert!(level.lights[0].position.chebyshev_distance(level.exit) <= 1);
        for light in &level.lights {
            assert!(level.grid.get(light.position).unwrap().kind.is_floor());
        }
    }

    #[test]
    fn test_monsters_come_from_depth_pool() {
        let mut level = generated(5, 12);
        let mut entities = player();
        let mut rng = utils::create_rng(13);
        populate_level(
            &mut level,
            &mut entities,
            &PopulationConfig::default(),
            &VisibilityConfig::default(),
            &mut rng,
        )
        .unwrap();

        let pool: Vec<MonsterKind> = monster_pool(5).iter().map(|(kind, _)| *kind).collect();
        assert!(!entities.monsters().is_empty());
        for monster in entities.monsters() {
            assert!(pool.contains(&monster.kind));
        }
    }

    #[test]
    fn test_level_without_open_tiles_is_rejected() {
        let mut grid = crate::game::Grid::new(8, 8);
        grid.set_tile(Position::new(3, 3), Tile::floor()).unwrap();
        grid.place_feature(Position::new(3, 3), FeatureKind::StairsDown);
        let mut level = Level {
            depth: 1,
            grid,
            exit: Position::new(3, 3),
            exit_kind: FeatureKind::StairsDown,
            lights: Vec::new(),
        };
        let mut entities = player();
        let mut rng = utils::create_rng(1);
        let result = populate_level(
            &mut level,
            &mut entities,
            &PopulationConfig::default(),
            &VisibilityConfig::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(EmberError::InvalidState(_))));
    }

    /// Two rooms joined by the single tile (5, 2), exit in the right room.
    fn chokepoint_level() -> Level {
        let mut grid = crate::game::Grid::new(12, 5);
        for y in 1..=3 {
            for x in (1..=4).chain(6..=10) {
                grid.set_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        grid.set_tile(Position::new(5, 2), Tile::floor()).unwrap();
        let exit = Position::new(10, 2);
        grid.place_feature(exit, FeatureKind::StairsDown);
        Level {
            depth: 1,
            grid,
            exit,
            exit_kind: FeatureKind::StairsDown,
            lights: Vec::new(),
        }
    }

    #[test]
    fn test_npcs_never_wall_off_the_exit() {
        let crowded = PopulationConfig {
            base_monsters: 0,
            monsters_per_depth: 0,
            max_npcs: 16,
            npc_max_depth: 10,
            ..PopulationConfig::default()
        };

        let mut saw_npcs = false;
        for seed in 0..60 {
            let mut level = chokepoint_level();
            let mut entities = player();
            let mut rng = utils::create_rng(seed);
            let spawn = populate_level(
                &mut level,
                &mut entities,
                &crowded,
                &VisibilityConfig::default(),
                &mut rng,
            )
            .unwrap();

            let npc_tiles: HashSet<Position> =
                entities.npcs().iter().map(|npc| npc.position()).collect();
            saw_npcs |= !npc_tiles.is_empty();
            assert!(!npc_tiles.contains(&Position::new(5, 2)), "seed {}", seed);

            let grid = &level.grid;
            let walkable = PassabilityGrid::from_fn(12, 5, |pos| {
                !npc_tiles.contains(&pos) && grid.get(pos).map_or(false, |t| t.is_walkable())
            });
            let reached = flood_fill(&walkable, spawn);
            assert!(reached.contains(&level.exit), "seed {}", seed);
            assert_eq!(reached.len(), walkable.count(), "seed {}", seed);
        }
        assert!(saw_npcs);
    }

    #[test]
    fn test_generated_levels_stay_reachable_after_population() {
        for depth in [3, 6] {
            for seed in 50..60 {
                let mut level = generated(depth, seed);
                let mut entities = player();
                let mut rng = utils::create_rng(seed);
                let spawn = populate_level(
                    &mut level,
                    &mut entities,
                    &PopulationConfig::default(),
                    &VisibilityConfig::default(),
                    &mut rng,
                )
                .unwrap();
                let npc_tiles: HashSet<Position> =
                    entities.npcs().iter().map(|npc| npc.position()).collect();
                let grid = &level.grid;
                let walkable = PassabilityGrid::from_fn(grid.width, grid.height, |pos| {
                    !npc_tiles.contains(&pos) && grid.get(pos).map_or(false, |t| t.is_walkable())
                });
                let reached = flood_fill(&walkable, spawn);
                assert!(reached.contains(&level.exit), "depth {} seed {}", depth, seed);
                assert_eq!(reached.len(), walkable.count());
            }
        }
    }
}
