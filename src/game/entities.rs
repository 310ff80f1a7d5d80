//! # Entities
//!
//! The player, decorative NPCs and hostile monsters.

use crate::game::{EntityId, Position};
use serde::{Deserialize, Serialize};

/// Inclusive damage range rolled on every attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: u32,
    pub max: u32,
}

impl DamageRange {
    /// Creates a damage range, swapping the bounds if given backwards.
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }
}

/// Health and damage shared by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    pub health: u32,
    pub max_health: u32,
    pub damage: DamageRange,
}

impl EntityStats {
    /// Creates stats at full health.
    pub fn new(max_health: u32, damage: DamageRange) -> Self {
        Self {
            health: max_health,
            max_health,
            damage,
        }
    }

    /// Returns true while health is above zero.
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Subtracts damage, flooring health at zero. Returns the new health.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Current health as a fraction of max health, for health bars.
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

/// Common read access to anything that stands on the grid.
pub trait Entity {
    /// Gets the unique identifier of this entity.
    fn id(&self) -> EntityId;

    /// Gets the current position of this entity.
    fn position(&self) -> Position;

    /// Gets the entity's health and damage.
    fn stats(&self) -> &EntityStats;

    /// Gets a short lowercase name for logs and UI labels.
    fn kind_name(&self) -> &'static str;

    /// Checks if the entity is alive.
    fn is_alive(&self) -> bool {
        self.stats().is_alive()
    }
}

/// The player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub position: Position,
    pub stats: EntityStats,
}

impl Player {
    /// Creates a player at full health.
    pub fn new(id: EntityId, position: Position, max_health: u32, damage: DamageRange) -> Self {
        Self {
            id,
            position,
            stats: EntityStats::new(max_health, damage),
        }
    }
}

impl Entity for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn stats(&self) -> &EntityStats {
        &self.stats
    }

    fn kind_name(&self) -> &'static str {
        "player"
    }
}

/// Hostile creature types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Rat,
    Bat,
    Slime,
    Goblin,
    Skeleton,
    Orc,
    Wraith,
    Demon,
}

/// Base numbers for a monster kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterTemplate {
    pub max_health: u32,
    pub damage: DamageRange,
    /// Ticks between two actions; 1 acts every tick
    pub action_interval: u64,
}

impl MonsterKind {
    /// Returns the stat block for this kind.
    pub fn template(self) -> MonsterTemplate {
        let (max_health, min, max, action_interval) = match self {
            MonsterKind::Rat => (8, 1, 3, 1),
            MonsterKind::Bat => (6, 1, 2, 1),
            MonsterKind::Slime => (14, 2, 4, 3),
            MonsterKind::Goblin => (16, 2, 5, 2),
            MonsterKind::Skeleton => (20, 3, 6, 2),
            MonsterKind::Orc => (28, 4, 8, 2),
            MonsterKind::Wraith => (24, 5, 9, 1),
            MonsterKind::Demon => (40, 6, 12, 2),
        };
        MonsterTemplate {
            max_health,
            damage: DamageRange::new(min, max),
            action_interval,
        }
    }

    /// Gets a lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            MonsterKind::Rat => "rat",
            MonsterKind::Bat => "bat",
            MonsterKind::Slime => "slime",
            MonsterKind::Goblin => "goblin",
            MonsterKind::Skeleton => "skeleton",
            MonsterKind::Orc => "orc",
            MonsterKind::Wraith => "wraith",
            MonsterKind::Demon => "demon",
        }
    }
}

/// A hostile entity driven by the monster AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub position: Position,
    pub stats: EntityStats,
    pub action_interval: u64,
    /// Tick of the last move or attack
    pub last_action_tick: u64,
}

impl Monster {
    /// Creates a monster from its kind's template.
    pub fn new(id: EntityId, kind: MonsterKind, position: Position) -> Self {
        let template = kind.template();
        Self {
            id,
            kind,
            position,
            stats: EntityStats::new(template.max_health, template.damage),
            action_interval: template.action_interval.max(1),
            last_action_tick: 0,
        }
    }

    /// Creates a monster with explicit stats, mostly for tests and scripted spawns.
    pub fn with_stats(
        id: EntityId,
        kind: MonsterKind,
        position: Position,
        stats: EntityStats,
    ) -> Self {
        Self {
            stats,
            ..Self::new(id, kind, position)
        }
    }

    /// Returns true if enough ticks passed since the last action.
    pub fn ready_to_act(&self, tick: u64) -> bool {
        tick.saturating_sub(self.last_action_tick) >= self.action_interval
    }
}

impl Entity for Monster {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn stats(&self) -> &EntityStats {
        &self.stats
    }

    fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Decorative, non-hostile characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    Wanderer,
    Herbalist,
    Hermit,
    Ghost,
}

impl NpcKind {
    /// Gets a lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            NpcKind::Wanderer => "wanderer",
            NpcKind::Herbalist => "herbalist",
            NpcKind::Hermit => "hermit",
            NpcKind::Ghost => "ghost",
        }
    }
}

/// A blocking, non-hostile character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: EntityId,
    pub kind: NpcKind,
    pub position: Position,
    pub stats: EntityStats,
}

impl Npc {
    /// Creates an NPC. NPCs never fight, their damage range is zero.
    pub fn new(id: EntityId, kind: NpcKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            stats: EntityStats::new(10, DamageRange::new(0, 0)),
        }
    }
}

impl Entity for Npc {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn stats(&self) -> &EntityStats {
        &self.stats
    }

    fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}
