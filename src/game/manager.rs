//! # Entity Manager
//!
//! Owns the player, NPC and monster collections and enforces the movement
//! and occupancy rules between them and the grid.

use crate::game::{
    resolve_attack, AttackOutcome, CombatConfig, Dice, Direction, Entity, EntityId, Grid,
    FeatureKind, Monster, Npc, Player, Position,
};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

/// Who is trying to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Player,
    Monster(EntityId),
}

/// Outcome of a movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Moved,
    Blocked,
    EnteredStairs,
    EnteredVictoryDoor,
    /// The destination holds a live monster; nobody moved
    InitiatedCombat(EntityId),
}

/// What a monster did on its AI step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterAction {
    Idle,
    Moved { from: Position, to: Position },
    Attacked(AttackOutcome),
}

/// Collections of everything standing on the current level.
#[derive(Debug, Clone)]
pub struct EntityManager {
    player: Player,
    npcs: Vec<Npc>,
    monsters: Vec<Monster>,
}

impl EntityManager {
    /// Creates a manager holding only the player.
    pub fn new(player: Player) -> Self {
        Self {
            player,
            npcs: Vec::new(),
            monsters: Vec::new(),
        }
    }

    /// Gets the player.
    pub fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Gets all NPCs.
    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// Gets all live monsters.
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    /// Gets the ids of all monsters in collection order.
    pub fn monster_ids(&self) -> Vec<EntityId> {
        self.monsters.iter().map(|monster| monster.id).collect()
    }

    /// Gets a monster by id.
    pub fn monster(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.iter().find(|monster| monster.id == id)
    }

    /// Gets the live monster standing at a position.
    pub fn monster_at(&self, pos: Position) -> Option<&Monster> {
        self.monsters
            .iter()
            .find(|monster| monster.position == pos && monster.is_alive())
    }

    /// Gets the NPC standing at a position.
    pub fn npc_at(&self, pos: Position) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.position == pos)
    }

    /// Returns true if any entity, player included, stands at the position.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.player.position == pos || self.npc_at(pos).is_some() || self.monster_at(pos).is_some()
    }

    /// Adds a monster unless its tile is already taken.
    pub fn add_monster(&mut self, monster: Monster) -> bool {
        if self.is_occupied(monster.position) {
            return false;
        }
        self.monsters.push(monster);
        true
    }

    /// Adds an NPC unless its tile is already taken.
    pub fn add_npc(&mut self, npc: Npc) -> bool {
        if self.is_occupied(npc.position) {
            return false;
        }
        self.npcs.push(npc);
        true
    }

    /// Drops every NPC and monster, keeping the player.
    pub fn clear_level_entities(&mut self) {
        self.npcs.clear();
        self.monsters.clear();
    }

    /// Places the player, e.g. at the spawn of a fresh level.
    pub fn place_player(&mut self, pos: Position) {
        self.player.position = pos;
    }

    /// Core passability predicate.
    ///
    /// False outside the grid, on walls, on movement-blocking features and
    /// under NPCs. The player and monsters are checked by callers.
    pub fn is_passable(&self, grid: &Grid, pos: Position) -> bool {
        grid.get(pos).is_some_and(|tile| tile.is_walkable()) && self.npc_at(pos).is_none()
    }

    /// Attempts a single step for the player or a monster.
    ///
    /// Invalid requests (dead mover, unknown monster, delta that is not a
    /// single king step) are rejected as [`MoveResult::Blocked`].
    pub fn attempt_move(&mut self, grid: &Grid, mover: Mover, delta: Position) -> MoveResult {
        if Direction::from_delta(delta).is_none() {
            return MoveResult::Blocked;
        }

        match mover {
            Mover::Player => {
                if !self.player.is_alive() {
                    return MoveResult::Blocked;
                }
                let dest = self.player.position + delta;
                if let Some(monster) = self.monster_at(dest) {
                    return MoveResult::InitiatedCombat(monster.id);
                }
                if !self.is_passable(grid, dest) {
                    return MoveResult::Blocked;
                }
                self.player.position = dest;
                match grid.get(dest).and_then(|tile| tile.feature) {
                    Some(FeatureKind::StairsDown) => MoveResult::EnteredStairs,
                    Some(FeatureKind::Door) => MoveResult::EnteredVictoryDoor,
                    _ => MoveResult::Moved,
                }
            }
            Mover::Monster(id) => {
                let Some(idx) = self.monster_index(id) else {
                    return MoveResult::Blocked;
                };
                let dest = self.monsters[idx].position + delta;
                if !self.monster_can_enter(grid, dest) {
                    return MoveResult::Blocked;
                }
                self.monsters[idx].position = dest;
                MoveResult::Moved
            }
        }
    }

    /// The player attacks a monster. A monster brought to zero health is
    /// removed from the collection.
    pub fn player_attack<D: Dice + ?Sized>(
        &mut self,
        monster_id: EntityId,
        config: &CombatConfig,
        dice: &mut D,
    ) -> Option<AttackOutcome> {
        let idx = self.monster_index(monster_id)?;
        let outcome = resolve_attack(
            &self.player.stats,
            &mut self.monsters[idx].stats,
            config,
            dice,
        )?;
        if outcome.killed {
            let monster = self.monsters.remove(idx);
            trace!("{} {} slain at {:?}", monster.kind_name(), monster.id, monster.position);
        }
        Some(outcome)
    }

    /// A monster attacks the player.
    pub fn monster_attack<D: Dice + ?Sized>(
        &mut self,
        monster_id: EntityId,
        config: &CombatConfig,
        dice: &mut D,
    ) -> Option<AttackOutcome> {
        let idx = self.monster_index(monster_id)?;
        resolve_attack(&self.monsters[idx].stats, &mut self.player.stats, config, dice)
    }

    /// Records that a monster used its action on `tick`.
    pub(crate) fn mark_acted(&mut self, monster_id: EntityId, tick: u64) {
        if let Some(idx) = self.monster_index(monster_id) {
            self.monsters[idx].last_action_tick = tick;
        }
    }

    /// Runs one AI step for a monster.
    ///
    /// Adjacent monsters attack; monsters within detection range step toward
    /// the player along the axis with the larger offset; everything else
    /// wanders one cardinal step. Monsters only act once their action
    /// interval has elapsed since `last_action_tick`.
    pub fn step_monster_ai<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        monster_id: EntityId,
        tick: u64,
        config: &CombatConfig,
        rng: &mut R,
    ) -> MonsterAction {
        let Some(idx) = self.monster_index(monster_id) else {
            return MonsterAction::Idle;
        };
        if !self.player.is_alive() || !self.monsters[idx].ready_to_act(tick) {
            return MonsterAction::Idle;
        }
        self.monsters[idx].last_action_tick = tick;

        let from = self.monsters[idx].position;
        let target = self.player.position;

        if from.chebyshev_distance(target) <= 1 {
            return match self.monster_attack(monster_id, config, rng) {
                Some(outcome) => MonsterAction::Attacked(outcome),
                None => MonsterAction::Idle,
            };
        }

        let direction = if from.manhattan_distance(target) < config.detection_range {
            step_toward(from, target, rng)
        } else {
            random_cardinal(rng)
        };

        match self.attempt_move(grid, Mover::Monster(monster_id), direction.to_delta()) {
            MoveResult::Moved => {
                let to = from + direction.to_delta();
                trace!("monster {} moved {:?} -> {:?}", monster_id, from, to);
                MonsterAction::Moved { from, to }
            }
            _ => MonsterAction::Idle,
        }
    }

    fn monster_index(&self, id: EntityId) -> Option<usize> {
        self.monsters
            .iter()
            .position(|monster| monster.id == id && monster.is_alive())
    }

    fn monster_can_enter(&self, grid: &Grid, pos: Position) -> bool {
        self.is_passable(grid, pos) && self.player.position != pos && self.monster_at(pos).is_none()
    }
}

/// Picks the cardinal step that closes the larger axis offset.
///
/// Equal offsets give no preference and fall back to a random direction.
fn step_toward<R: Rng + ?Sized>(from: Position, to: Position, rng: &mut R) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if dy.abs() > dx.abs() {
        if dy > 0 {
            Direction::South
        } else {
            Direction::North
        }
    } else {
        random_cardinal(rng)
    }
}

fn random_cardinal<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    *Direction::CARDINAL
        .choose(rng)
        .unwrap_or(&Direction::North)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DamageRange, EntityStats, MonsterKind, NpcKind, Tile};
    use rand::{rngs::StdRng, SeedableRng};
    use uuid::Uuid;

    fn open_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                grid.set_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        grid
    }

    fn manager_at(pos: Position) -> EntityManager {
        EntityManager::new(Player::new(Uuid::from_u128(1), pos, 100, DamageRange::new(4, 9)))
    }

    fn monster(id: u128, pos: Position, health: u32) -> Monster {
        Monster::with_stats(
            Uuid::from_u128(id),
            MonsterKind::Goblin,
            pos,
            EntityStats::new(health, DamageRange::new(3, 7)),
        )
    }

    struct FixedDice(u32);

    impl Dice for FixedDice {
        fn roll_damage(&mut self, _range: DamageRange) -> u32 {
            self.0
        }

        fn roll_chance(&mut self, _probability: f64) -> bool {
            false
        }
    }

    #[test]
    fn test_is_passable_rules() {
        let mut grid = open_grid(8, 8);
        let mut manager = manager_at(Position::new(1, 1));
        grid.place_feature(Position::new(3, 3), FeatureKind::Tree);
        grid.place_feature(Position::new(4, 4), FeatureKind::Mushroom);
        manager.add_npc(Npc::new(Uuid::from_u128(5), NpcKind::Hermit, Position::new(5, 5)));

        assert!(manager.is_passable(&grid, Position::new(2, 2)));
        assert!(!manager.is_passable(&grid, Position::new(0, 0))); // wall
        assert!(!manager.is_passable(&grid, Position::new(-1, 3))); // out of bounds
        assert!(!manager.is_passable(&grid, Position::new(3, 3))); // tree
        assert!(manager.is_passable(&grid, Position::new(4, 4))); // mushroom
        assert!(!manager.is_passable(&grid, Position::new(5, 5))); // npc
    }

    #[test]
    fn test_player_moves_and_hits_walls() {
        let grid = open_grid(6, 6);
        let mut manager = manager_at(Position::new(1, 1));

        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(1, 0)),
            MoveResult::Moved
        );
        assert_eq!(manager.player().position, Position::new(2, 1));
        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(0, -1)),
            MoveResult::Blocked
        );
        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(2, 0)),
            MoveResult::Blocked
        );
        assert_eq!(manager.player().position, Position::new(2, 1));
    }

    #[test]
    fn test_player_enters_exits() {
        let mut grid = open_grid(6, 6);
        grid.place_feature(Position::new(2, 1), FeatureKind::StairsDown);
        grid.place_feature(Position::new(1, 2), FeatureKind::Door);
        let mut manager = manager_at(Position::new(1, 1));

        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(1, 0)),
            MoveResult::EnteredStairs
        );
        manager.place_player(Position::new(1, 1));
        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(0, 1)),
            MoveResult::EnteredVictoryDoor
        );
    }

    #[test]
    fn test_moving_into_monster_initiates_combat() {
        let grid = open_grid(6, 6);
        let mut manager = manager_at(Position::new(1, 1));
        manager.add_monster(monster(7, Position::new(2, 1), 20));

        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(1, 0)),
            MoveResult::InitiatedCombat(Uuid::from_u128(7))
        );
        assert_eq!(manager.player().position, Position::new(1, 1));
    }

    #[test]
    fn test_killed_monster_frees_its_tile() {
        let grid = open_grid(6, 6);
        let mut manager = manager_at(Position::new(1, 1));
        let spot = Position::new(2, 1);
        manager.add_monster(monster(7, spot, 20));

        let outcome = manager
            .player_attack(Uuid::from_u128(7), &CombatConfig::default(), &mut FixedDice(20))
            .unwrap();
        assert!(outcome.killed);
        assert!(manager.monsters().is_empty());
        assert!(manager.is_passable(&grid, spot));
        assert!(!manager.is_occupied(spot));
    }

    #[test]
    fn test_add_refuses_occupied_tiles() {
        let mut manager = manager_at(Position::new(1, 1));
        assert!(!manager.add_monster(monster(2, Position::new(1, 1), 5)));
        assert!(manager.add_monster(monster(3, Position::new(2, 2), 5)));
        let ghost = Npc::new(Uuid::from_u128(4), NpcKind::Ghost, Position::new(2, 2));
        assert!(!manager.add_npc(ghost));
    }

    #[test]
    fn test_adjacent_monster_attacks() {
        let grid = open_grid(8, 8);
        let mut manager = manager_at(Position::new(3, 3));
        manager.add_monster(monster(9, Position::new(4, 4), 20));
        let mut rng = StdRng::seed_from_u64(3);

        let config = CombatConfig::default();
        let action = manager.step_monster_ai(&grid, Uuid::from_u128(9), 10, &config, &mut rng);
        assert!(matches!(action, MonsterAction::Attacked(_)));
        assert!(manager.player().stats.health < 100);
        assert_eq!(manager.monster(Uuid::from_u128(9)).unwrap().position, Position::new(4, 4));
    }

    #[test]
    fn test_monster_chases_along_larger_axis() {
        let grid = open_grid(12, 12);
        let mut manager = manager_at(Position::new(2, 5));
        manager.add_monster(monster(9, Position::new(5, 4), 20));
        let mut rng = StdRng::seed_from_u64(3);

        let config = CombatConfig::default();
        let action = manager.step_monster_ai(&grid, Uuid::from_u128(9), 10, &config, &mut rng);
        assert_eq!(
            action,
            MonsterAction::Moved {
                from: Position::new(5, 4),
                to: Position::new(4, 4)
            }
        );
    }

    #[test]
    fn test_monster_respects_action_interval() {
        let grid = open_grid(12, 12);
        let mut manager = manager_at(Position::new(2, 5));
        manager.add_monster(monster(9, Position::new(5, 4), 20));
        let config = CombatConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let id = Uuid::from_u128(9);

        // Goblins act every second tick
        let action = manager.step_monster_ai(&grid, id, 2, &config, &mut rng);
        assert!(matches!(action, MonsterAction::Moved { .. }));
        assert_eq!(manager.step_monster_ai(&grid, id, 3, &config, &mut rng), MonsterAction::Idle);
        let action = manager.step_monster_ai(&grid, id, 4, &config, &mut rng);
        assert!(matches!(action, MonsterAction::Moved { .. }));
    }

    #[test]
    fn test_monsters_never_stack() {
        let grid = open_grid(5, 5);
        let mut manager = manager_at(Position::new(1, 1));
        manager.add_monster(monster(2, Position::new(3, 3), 5));
        manager.add_monster(monster(3, Position::new(3, 2), 5));

        assert_eq!(
            manager.attempt_move(&grid, Mover::Monster(Uuid::from_u128(3)), Position::new(0, 1)),
            MoveResult::Blocked
        );
        // Monsters cannot walk onto the player either
        manager.place_player(Position::new(2, 2));
        assert_eq!(
            manager.attempt_move(&grid, Mover::Monster(Uuid::from_u128(3)), Position::new(-1, 0)),
            MoveResult::Blocked
        );
    }

    #[test]
    fn test_dead_player_cannot_move() {
        let grid = open_grid(5, 5);
        let mut manager = manager_at(Position::new(1, 1));
        manager.player_mut().stats.take_damage(1000);
        assert_eq!(
            manager.attempt_move(&grid, Mover::Player, Position::new(1, 0)),
            MoveResult::Blocked
        );
    }
}
